//! Form-side helpers that run before a draft reaches the controller.

use std::{ops::RangeInclusive, sync::Arc};

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use shared::protocol::{Reservation, ReservationDraft};
use thiserror::Error;

use crate::{controller::ReservationController, error::CreateReservationError};

pub const PARTY_SIZE_RANGE: RangeInclusive<u32> = 1..=20;

const FIRST_SLOT_HOUR: u32 = 11;
const LAST_SLOT_HOUR: u32 = 22;
const SLOT_MINUTES: [u32; 2] = [0, 30];
const BOOKING_WINDOW_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("please select a future date and time")]
    NotInFuture,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Create(#[from] CreateReservationError),
}

/// Bookable times of day: every half hour from 11:00 through 22:30.
pub fn time_slots() -> Vec<NaiveTime> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .flat_map(|hour| {
            SLOT_MINUTES
                .into_iter()
                .filter_map(move |minute| NaiveTime::from_hms_opt(hour, minute, 0))
        })
        .collect()
}

pub fn is_time_slot(time: NaiveTime) -> bool {
    time_slots().contains(&time)
}

/// Dates offered for booking, `today` through six months ahead.
pub fn booking_window(today: NaiveDate) -> RangeInclusive<NaiveDate> {
    let last = today
        .checked_add_months(Months::new(BOOKING_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX);
    today..=last
}

#[derive(Debug, Clone, Default)]
pub struct ReservationForm {
    draft: ReservationDraft,
}

impl ReservationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ReservationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ReservationDraft {
        &mut self.draft
    }

    pub fn reset(&mut self) {
        self.draft = ReservationDraft::default();
    }

    /// Blocks date/time selections that are not strictly after `now`.
    /// Missing fields are left to the controller's own checks.
    pub fn check_schedule(&self, now: NaiveDateTime) -> Result<(), FormError> {
        match self.draft.scheduled_at() {
            Some(at) if at <= now => Err(FormError::NotInFuture),
            _ => Ok(()),
        }
    }

    pub fn submission(&self, now: NaiveDateTime) -> Result<ReservationDraft, FormError> {
        self.check_schedule(now)?;
        Ok(self.draft.clone())
    }

    /// Submits through the controller; the draft is cleared only on success.
    pub async fn submit(
        &mut self,
        controller: &Arc<ReservationController>,
        now: NaiveDateTime,
    ) -> Result<Reservation, SubmitError> {
        let draft = self.submission(now)?;
        let reservation = controller.create_reservation(&draft).await?;
        self.reset();
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: (i32, u32, u32), time: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .and_then(|day| day.and_hms_opt(time.0, time.1, 0))
            .expect("valid datetime")
    }

    #[test]
    fn slots_cover_service_hours_in_half_hours() {
        let slots = time_slots();
        assert_eq!(slots.len(), 24);
        assert_eq!(slots.first(), NaiveTime::from_hms_opt(11, 0, 0).as_ref());
        assert_eq!(slots.last(), NaiveTime::from_hms_opt(22, 30, 0).as_ref());
        assert!(is_time_slot(NaiveTime::from_hms_opt(19, 30, 0).expect("time")));
        assert!(!is_time_slot(NaiveTime::from_hms_opt(19, 15, 0).expect("time")));
        assert!(!is_time_slot(NaiveTime::from_hms_opt(10, 30, 0).expect("time")));
    }

    #[test]
    fn booking_window_spans_six_months_and_clamps_month_end() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 31).expect("date");
        let window = booking_window(today);
        assert_eq!(*window.start(), today);
        assert_eq!(
            *window.end(),
            NaiveDate::from_ymd_opt(2026, 2, 28).expect("date")
        );
    }

    #[test]
    fn schedule_must_be_strictly_in_the_future() {
        let mut form = ReservationForm::new();
        form.draft_mut().reservation_date = NaiveDate::from_ymd_opt(2030, 5, 1);
        form.draft_mut().reservation_time = NaiveTime::from_hms_opt(19, 0, 0);

        assert_eq!(
            form.check_schedule(at((2030, 5, 1), (19, 0))),
            Err(FormError::NotInFuture)
        );
        assert_eq!(
            form.check_schedule(at((2030, 5, 2), (9, 0))),
            Err(FormError::NotInFuture)
        );
        assert_eq!(form.check_schedule(at((2030, 5, 1), (18, 59))), Ok(()));
    }

    #[test]
    fn incomplete_schedule_is_left_to_controller_validation() {
        let form = ReservationForm::new();
        let draft = form
            .submission(at((2030, 1, 1), (12, 0)))
            .expect("no schedule to check");
        assert_eq!(draft, ReservationDraft::default());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = ReservationForm::new();
        form.draft_mut().customer_name = "Ana".into();
        form.draft_mut().party_size = 6;

        form.reset();

        assert_eq!(form.draft(), &ReservationDraft::default());
    }
}
