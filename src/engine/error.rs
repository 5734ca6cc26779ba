use thiserror::Error;

/// Why a single resource did not load. Recorded as the outcome reason, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("timeout exceeded budget")]
    Timeout,
    #[error("HTTP {0}")]
    Http(u16),
    /// The generic fetch aborted itself at its sub-deadline.
    #[error("request timed out")]
    RequestTimedOut,
    #[error("network error: {0}")]
    Network(String),
    #[error("image failed to load")]
    ImageLoad,
    #[error("font failed to load")]
    FontLoad,
    #[error("decode failed: {0}")]
    Decode(String),
    /// The owning session was destroyed while the load was in flight.
    #[error("load cancelled")]
    Cancelled,
    #[error("load task aborted: {0}")]
    TaskAborted(String),
}

impl LoadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LoadError::Timeout)
    }
}
