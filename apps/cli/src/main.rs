mod config;
mod render;

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use client_core::{
    form::{booking_window, is_time_slot, PARTY_SIZE_RANGE},
    HttpReservationGateway, ReservationController, ReservationForm, SubmitError,
};
use shared::{
    domain::{ReservationId, ReservationStatus, TablePreference},
    protocol::{parse_reservation_date, parse_reservation_time, ReservationUpdate},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "reservas", about = "Book and manage restaurant table reservations")]
struct Cli {
    /// Reservation service base URL, e.g. http://localhost:3000/api
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every reservation.
    List,
    /// Request a new reservation.
    Book(BookArgs),
    /// Show the reservations for one day.
    ByDate {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Change fields of an existing reservation.
    Update(UpdateArgs),
    /// Delete a reservation.
    Cancel { id: String },
}

#[derive(Args, Debug)]
struct BookArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, value_parser = parse_date)]
    date: NaiveDate,
    #[arg(long, value_parser = parse_time)]
    time: NaiveTime,
    #[arg(long, default_value_t = shared::protocol::DEFAULT_PARTY_SIZE)]
    party_size: u32,
    /// Terraza, Ventana, Privada, or a table number.
    #[arg(long, value_parser = parse_table)]
    table: Option<TablePreference>,
    #[arg(long)]
    requests: Option<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,
    #[arg(long, value_parser = parse_status)]
    status: Option<ReservationStatus>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,
    #[arg(long)]
    party_size: Option<u32>,
    #[arg(long, value_parser = parse_table)]
    table: Option<TablePreference>,
    #[arg(long)]
    requests: Option<String>,
}

impl UpdateArgs {
    fn changes(&self) -> ReservationUpdate {
        ReservationUpdate {
            customer_name: self.name.clone(),
            customer_email: self.email.clone(),
            customer_phone: self.phone.clone(),
            reservation_date: self.date,
            reservation_time: self.time,
            party_size: self.party_size,
            table_preference: self.table.clone(),
            special_requests: self.requests.clone(),
            status: self.status.clone(),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_reservation_date(raw).map_err(|err| format!("expected YYYY-MM-DD ({err})"))
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    parse_reservation_time(raw).map_err(|err| format!("expected HH:MM ({err})"))
}

fn parse_table(raw: &str) -> Result<TablePreference, String> {
    TablePreference::parse(raw).ok_or_else(|| {
        let known: Vec<String> = TablePreference::CATEGORIES
            .into_iter()
            .map(|table| table.to_string())
            .collect();
        format!("expected {} or a table number", known.join(", "))
    })
}

fn parse_status(raw: &str) -> Result<ReservationStatus, String> {
    ReservationStatus::parse(raw).ok_or_else(|| {
        let known: Vec<String> = ReservationStatus::ALL
            .into_iter()
            .map(|status| status.as_str().to_string())
            .collect();
        format!("expected one of: {}", known.join(", "))
    })
}

fn check_party_size(party_size: u32) -> Result<()> {
    if !PARTY_SIZE_RANGE.contains(&party_size) {
        bail!(
            "party size must be between {} and {}",
            PARTY_SIZE_RANGE.start(),
            PARTY_SIZE_RANGE.end()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    let gateway = HttpReservationGateway::from_options(&settings.gateway_options())?;
    info!(api = %gateway.base_url(), "reservas: using reservation service");
    let controller = ReservationController::with_notice_ttl(Arc::new(gateway), settings.notice_ttl());

    match cli.command {
        Command::List => list(&controller).await,
        Command::Book(args) => book(&controller, args).await,
        Command::ByDate { date } => {
            let reservations = controller.gateway().list_by_date(date).await?;
            println!("{}", render::reservation_table(&reservations));
            Ok(())
        }
        Command::Update(args) => {
            let changes = args.changes();
            if changes.is_empty() {
                bail!("nothing to update; pass at least one field to change");
            }
            if let Some(party_size) = changes.party_size {
                check_party_size(party_size)?;
            }
            let updated = controller
                .gateway()
                .update(&ReservationId::from(args.id), &changes)
                .await?;
            println!("updated reservation");
            println!("{}", render::reservation_row(&updated));
            Ok(())
        }
        Command::Cancel { id } => {
            let confirmation = controller.gateway().remove(&ReservationId::from(id)).await?;
            println!(
                "{}",
                confirmation
                    .message
                    .as_deref()
                    .unwrap_or("reservation deleted")
            );
            Ok(())
        }
    }
}

async fn list(controller: &Arc<ReservationController>) -> Result<()> {
    controller.set_visibility(true);
    controller.fetch_reservations().await;

    let state = controller.snapshot();
    if let Some(error) = state.error {
        bail!(error);
    }
    println!("{}", render::reservation_table(&state.reservations));
    Ok(())
}

async fn book(controller: &Arc<ReservationController>, args: BookArgs) -> Result<()> {
    check_party_size(args.party_size)?;

    let window = booking_window(Local::now().date_naive());
    if !window.contains(&args.date) {
        bail!(
            "date must be between {} and {}",
            window.start(),
            window.end()
        );
    }
    if !is_time_slot(args.time) {
        warn!(
            time = %args.time.format("%H:%M"),
            "reservas: requested time is outside the usual half-hour slots (11:00-22:30)"
        );
    }

    let mut form = ReservationForm::new();
    let draft = form.draft_mut();
    draft.customer_name = args.name;
    draft.customer_email = args.email;
    draft.customer_phone = args.phone;
    draft.reservation_date = Some(args.date);
    draft.reservation_time = Some(args.time);
    draft.party_size = args.party_size;
    draft.table_preference = args.table;
    draft.special_requests = args.requests;

    match form.submit(controller, Local::now().naive_local()).await {
        Ok(reservation) => {
            let state = controller.snapshot();
            if let Some(message) = state.success_message {
                println!("{message}");
            }
            println!("{}", render::reservation_row(&reservation));
            Ok(())
        }
        Err(SubmitError::Form(err)) => bail!(err),
        Err(SubmitError::Create(err)) => {
            let message = controller
                .snapshot()
                .error
                .unwrap_or_else(|| err.to_string());
            bail!(message)
        }
    }
}
