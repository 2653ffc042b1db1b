//! Client-side reservation state: one owned state value, four commands, and
//! an atomic state transition per command continuation.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::protocol::{Reservation, ReservationDraft};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{error::CreateReservationError, gateway::ReservationGateway};

pub const CREATED_MESSAGE: &str = "reservation created successfully!";
pub const LOAD_FAILED_MESSAGE: &str = "failed to load reservations";
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Form,
    List,
}

impl Visibility {
    pub fn from_show_list(show: bool) -> Self {
        if show {
            Visibility::List
        } else {
            Visibility::Form
        }
    }

    pub fn is_list(self) -> bool {
        self == Visibility::List
    }
}

/// Everything a presentation layer reads.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub reservations: Vec<Reservation>,
    pub visibility: Visibility,
    pub loading: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
    ledger: CommandLedger,
}

#[derive(Debug, Clone, Copy, Default)]
struct Ticket {
    epoch: u64,
    seq: u64,
}

/// Bookkeeping that keeps overlapping commands from clobbering each other.
#[derive(Debug, Clone, Default)]
struct CommandLedger {
    epoch: u64,
    next_seq: u64,
    in_flight: usize,
    listings_in_flight: usize,
    applied_listing: Option<u64>,
    // Creates that resolved while a listing was in flight, stamped with the
    // seq at resolution. Empty whenever no listing is in flight.
    recent_creates: Vec<(u64, Reservation)>,
    notice_generation: u64,
}

impl CommandLedger {
    fn issue(&mut self) -> Ticket {
        self.next_seq += 1;
        self.in_flight += 1;
        Ticket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }

    fn issue_listing(&mut self) -> Ticket {
        self.listings_in_flight += 1;
        self.issue()
    }

    fn stamp(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Returns `false` when the ticket belongs to a session that was reset.
    fn settle(&mut self, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        true
    }

    fn settle_listing(&mut self, ticket: Ticket) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.listings_in_flight = self.listings_in_flight.saturating_sub(1);
        true
    }

    fn retire_creates(&mut self) {
        if self.listings_in_flight == 0 {
            self.recent_creates.clear();
        }
    }

    fn is_stale_listing(&self, ticket: Ticket) -> bool {
        self.applied_listing
            .is_some_and(|applied| applied > ticket.seq)
    }

    fn next_session(&self) -> Self {
        Self {
            epoch: self.epoch + 1,
            next_seq: self.next_seq,
            notice_generation: self.notice_generation,
            ..Self::default()
        }
    }
}

impl ControllerState {
    fn sync_loading(&mut self) {
        self.loading = self.ledger.in_flight > 0;
    }

    fn apply_listing(&mut self, ticket: Ticket, listing: Vec<Reservation>) -> bool {
        if self.ledger.is_stale_listing(ticket) {
            return false;
        }
        self.ledger.applied_listing = Some(ticket.seq);

        let carried: Vec<Reservation> = self
            .ledger
            .recent_creates
            .iter()
            .filter(|(stamp, created)| {
                *stamp > ticket.seq && !listing.iter().any(|listed| listed.id == created.id)
            })
            .map(|(_, created)| created.clone())
            .collect();
        self.ledger
            .recent_creates
            .retain(|(stamp, _)| *stamp > ticket.seq);

        self.reservations = listing;
        self.reservations.extend(carried);
        true
    }

    fn apply_listing_failure(&mut self, ticket: Ticket) -> bool {
        if self.ledger.is_stale_listing(ticket) {
            return false;
        }
        self.error = Some(LOAD_FAILED_MESSAGE.to_string());
        true
    }

    fn apply_created(&mut self, reservation: Reservation) -> u64 {
        let stamp = self.ledger.stamp();
        if self.ledger.listings_in_flight > 0 {
            self.ledger.recent_creates.push((stamp, reservation.clone()));
        }
        self.reservations.push(reservation);
        self.success_message = Some(CREATED_MESSAGE.to_string());
        self.ledger.notice_generation += 1;
        self.ledger.notice_generation
    }
}

/// Owns [`ControllerState`] for one client session and runs the commands
/// that change it.
pub struct ReservationController {
    gateway: Arc<dyn ReservationGateway>,
    state: watch::Sender<ControllerState>,
    notice_ttl: Duration,
    notice_timer: Mutex<Option<JoinHandle<()>>>,
}

impl ReservationController {
    pub fn new(gateway: Arc<dyn ReservationGateway>) -> Arc<Self> {
        Self::with_notice_ttl(gateway, DEFAULT_NOTICE_TTL)
    }

    pub fn with_notice_ttl(gateway: Arc<dyn ReservationGateway>, notice_ttl: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(ControllerState::default());
        Arc::new(Self {
            gateway,
            state,
            notice_ttl,
            notice_timer: Mutex::new(None),
        })
    }

    pub fn gateway(&self) -> &Arc<dyn ReservationGateway> {
        &self.gateway
    }

    pub fn snapshot(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Observes every state transition; the receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn set_visibility(&self, show: bool) {
        let visibility = Visibility::from_show_list(show);
        self.state.send_if_modified(|state| {
            let changed = state.visibility != visibility;
            state.visibility = visibility;
            changed
        });
    }

    pub fn clear_messages(&self) {
        self.cancel_notice_timer();
        self.state.send_modify(|state| {
            state.error = None;
            state.success_message = None;
        });
    }

    /// Starts a fresh session. Commands still in flight resolve into nothing.
    pub fn reset(&self) {
        self.cancel_notice_timer();
        self.state.send_modify(|state| {
            *state = ControllerState {
                ledger: state.ledger.next_session(),
                ..ControllerState::default()
            };
        });
        info!("reservations: controller session reset");
    }

    /// Replaces the collection with the service's listing. Failures are
    /// recorded in `error`; the previous collection is kept.
    pub async fn fetch_reservations(&self) {
        let ticket = self.begin(CommandLedger::issue_listing, |state| state.error = None);

        let outcome = self.gateway.list_all().await;

        let mut report = None;
        self.state.send_modify(|state| {
            if !state.ledger.settle_listing(ticket) {
                return;
            }
            report = match outcome {
                Ok(listing) => {
                    let count = listing.len();
                    state.apply_listing(ticket, listing).then_some(Ok(count))
                }
                Err(err) => state.apply_listing_failure(ticket).then_some(Err(err)),
            };
            state.ledger.retire_creates();
            state.sync_loading();
        });

        match report {
            Some(Ok(count)) => info!("reservations: loaded {count} reservations"),
            Some(Err(err)) => warn!("reservations: failed to load reservations: {err}"),
            None => debug!(
                seq = ticket.seq,
                "reservations: discarded superseded listing result"
            ),
        }
    }

    /// Validates locally, then submits. On success the reservation is
    /// appended and a transient confirmation is shown; on failure the error
    /// is recorded and returned so the caller can keep its draft.
    pub async fn create_reservation(
        self: &Arc<Self>,
        draft: &ReservationDraft,
    ) -> Result<Reservation, CreateReservationError> {
        if let Err(err) = draft.validate() {
            warn!("reservations: draft rejected before submission: {err}");
            return Err(err.into());
        }

        self.cancel_notice_timer();
        let ticket = self.begin(CommandLedger::issue, |state| {
            state.error = None;
            state.success_message = None;
        });

        match self.gateway.create(draft).await {
            Ok(reservation) => {
                let mut notice = None;
                self.state.send_modify(|state| {
                    if !state.ledger.settle(ticket) {
                        return;
                    }
                    let generation = state.apply_created(reservation.clone());
                    notice = Some((state.ledger.epoch, generation));
                    state.sync_loading();
                });
                if let Some((epoch, generation)) = notice {
                    self.schedule_notice_expiry(epoch, generation);
                }
                info!(
                    "reservations: created reservation id={} party_size={}",
                    reservation.id, reservation.party_size
                );
                Ok(reservation)
            }
            Err(err) => {
                self.state.send_modify(|state| {
                    if !state.ledger.settle(ticket) {
                        return;
                    }
                    state.error = Some(err.message().to_string());
                    state.sync_loading();
                });
                warn!("reservations: failed to create reservation: {err}");
                Err(err.into())
            }
        }
    }

    fn begin(
        &self,
        issue: fn(&mut CommandLedger) -> Ticket,
        prepare: impl FnOnce(&mut ControllerState),
    ) -> Ticket {
        let mut ticket = Ticket::default();
        self.state.send_modify(|state| {
            prepare(state);
            ticket = issue(&mut state.ledger);
            state.sync_loading();
        });
        ticket
    }

    fn schedule_notice_expiry(self: &Arc<Self>, epoch: u64, generation: u64) {
        let controller = Arc::downgrade(self);
        let ttl = self.notice_ttl;
        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller.state.send_if_modified(|state| {
                if state.ledger.epoch != epoch || state.ledger.notice_generation != generation {
                    return false;
                }
                state.success_message.take().is_some()
            });
        });

        if let Some(previous) = self.notice_timer_slot().replace(task) {
            previous.abort();
        }
    }

    fn cancel_notice_timer(&self) {
        if let Some(task) = self.notice_timer_slot().take() {
            task.abort();
        }
    }

    fn notice_timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.notice_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ReservationController {
    fn drop(&mut self) {
        self.cancel_notice_timer();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
