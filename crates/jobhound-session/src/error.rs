use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised while fetching pages through origin sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("blocked by {origin}: {reason}")]
    Blocked {
        origin: String,
        reason: String,
    },

    #[error("HTTP status {status} from {url}")]
    Status {
        status: u16,
        url: String,
    },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("session manager is shut down")]
    Closed,
}

impl SessionError {
    /// Whether this failure indicates the origin is actively refusing us.
    ///
    /// Blocking failures feed the circuit breaker; transient ones do not.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        match self {
            Self::Blocked { .. } => true,
            Self::Status { status, .. } => *status == 403 || *status == 429,
            _ => false,
        }
    }

    /// Whether a retry without rotating the session could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
            || matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}
