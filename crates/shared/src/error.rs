use thiserror::Error;

/// Local, pre-network rejection of a reservation draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("name is required.")]
    MissingName,
    #[error("email is required.")]
    MissingEmail,
    #[error("date is required.")]
    MissingDate,
    #[error("time is required.")]
    MissingTime,
}
