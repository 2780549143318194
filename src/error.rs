//! Error taxonomy for the dispatch engine.
//!
//! Three failure classes cross the library boundary: bad input
//! (`Validation`), missing entities (`NotFound`) and uniqueness violations
//! (`Conflict`). Geospatial degradation is deliberately *not* an error;
//! routing functions fall back to documented defaults instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: bad time strings, inverted ranges, out-of-range
    /// day-of-week, and similar caller mistakes. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist (or is not visible to the
    /// caller's organization).
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Uniqueness violation: duplicate override for a date, duplicate
    /// qualification, or a storage-level constraint hit at write time.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
