use thiserror::Error;

/// Every failure the client can surface.
///
/// Payloads are plain strings so the error can travel inside UI events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Bluetooth access is blocked (no adapter, adapter off, or OS refusal)
    #[error("Bluetooth access denied: {0}")]
    PermissionDenied(String),

    /// Connecting to the sensor or discovering its characteristic failed
    #[error("Sensor connection failed: {0}")]
    ConnectionFailure(String),

    /// A notification payload could not be turned into an impact count
    #[error("Malformed sensor payload: {0}")]
    DecodeFailure(String),

    /// The request did not reach the server or came back non-2xx
    #[error("Network error: {0}")]
    NetworkFailure(String),

    /// Client-side form checks
    #[error("{0}")]
    ValidationFailure(String),

    /// The server answered 2xx but refused the request with a message
    #[error("{0}")]
    Rejected(String),

    /// A Bluetooth command that is not allowed in the current link state
    #[error("Invalid sensor state: {0}")]
    InvalidState(String),
}

impl AppError {
    /// Failures worth a user-facing alert rather than just a log line
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AppError::DecodeFailure(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
