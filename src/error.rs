//! Error types for the message tree engine.

use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while storing or materializing messages.
///
/// A missing parent on a children listing is deliberately not represented
/// here: it yields an empty listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Message content or draft fields were rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored data violates an invariant the engine relies on
    /// (unresolvable author, duplicate identifier, parent cycle)
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A store operation failed or did not finish within the read deadline
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new data integrity error.
    pub fn data_integrity<T: ToString>(msg: T) -> Self {
        Self::DataIntegrity(msg.to_string())
    }

    /// Creates a new store unavailable error.
    pub fn store_unavailable<T: ToString>(msg: T) -> Self {
        Self::StoreUnavailable(msg.to_string())
    }

    /// Whether retrying the same call later could succeed.
    ///
    /// The engine never retries on its own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
