//! Session error types.

use thiserror::Error;

/// Result of a snapshot accessor.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by session accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The backing store could not be read.
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// Description of the store failure.
        reason: String,
    },

    /// The session was closed (signed out or torn down).
    #[error("session closed")]
    Closed,

    /// The crypto store rejected the read.
    #[error("crypto error: {reason}")]
    Crypto {
        /// Description of the crypto failure.
        reason: String,
    },

    /// Query parameters cannot be evaluated.
    #[error("invalid query parameters: {reason}")]
    InvalidParams {
        /// Description of the parameter problem.
        reason: String,
    },
}

impl SessionError {
    /// Returns true if a later read may succeed.
    ///
    /// A closed session and bad parameters stay broken; store and crypto
    /// failures can clear up.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::StoreUnavailable { .. } | Self::Crypto { .. } => true,
            Self::Closed | Self::InvalidParams { .. } => false,
        }
    }
}
