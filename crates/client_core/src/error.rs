use shared::error::DraftError;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of a remote reservation operation. Both variants carry a
/// message that can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Connection failure, unreadable response, or a non-success status
    /// without a usable reason.
    #[error("{0}")]
    Transport(String),
    /// Non-success status with a reason supplied by the service.
    #[error("{0}")]
    Service(String),
}

impl GatewayError {
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Transport(message) | GatewayError::Service(message) => message,
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, GatewayError::Service(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateReservationError {
    #[error(transparent)]
    Validation(#[from] DraftError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
