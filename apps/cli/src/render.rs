use shared::protocol::Reservation;

const UNASSIGNED_TABLE: &str = "to be assigned";

pub fn reservation_row(reservation: &Reservation) -> String {
    let table = reservation
        .table_preference
        .as_ref()
        .map(|table| table.as_str())
        .unwrap_or(UNASSIGNED_TABLE);
    format!(
        "{:<8} {}  {:>2} guests  {:<14}  {:<9}  {} <{}>",
        reservation.id,
        reservation.scheduled_at().format("%a %d %b %Y  %H:%M"),
        reservation.party_size,
        table,
        reservation.status.label(),
        reservation.customer_name,
        reservation.customer_email,
    )
}

pub fn count_line(count: usize) -> String {
    let noun = if count == 1 { "reservation" } else { "reservations" };
    format!("{count} {noun}")
}

pub fn reservation_table(reservations: &[Reservation]) -> String {
    if reservations.is_empty() {
        return "no reservations yet".to_string();
    }
    let mut lines: Vec<String> = reservations.iter().map(reservation_row).collect();
    lines.push(count_line(reservations.len()));
    lines.join("\n")
}
