//! Error types for the secret store.

use std::time::Duration;

/// Errors returned by [`SecretStore`](crate::SecretStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested time-to-live is zero or outside the configured bounds
    #[error("invalid ttl {ttl:?}: must be between {min:?} and {max:?}")]
    InvalidTtl {
        ttl: Duration,
        min: Duration,
        max: Duration,
    },

    /// No record exists for the id: it never existed, or was already consumed
    #[error("secret not found")]
    NotFound,

    /// The record existed but its deadline had passed; it has now been removed
    #[error("secret has expired")]
    Gone,

    /// Every generated id collided with a live one
    #[error("unable to allocate a unique secret id")]
    IdSpaceExhausted,
}

/// Result type alias for secret store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
