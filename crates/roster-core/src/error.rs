//! # Error Types
//!
//! Domain validation errors for roster-core.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  roster-core (this file)                                               │
//! │  └── ValidationError  - Field or invariant violation                   │
//! │                                                                         │
//! │  roster-db (separate crate)                                            │
//! │  └── DbError          - Store, pool, transaction, migration failures   │
//! │                                                                         │
//! │  Flow: ValidationError → DbError::Validation → API layer               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Input validation errors.
///
/// Raised before a write reaches the store, so the caller learns which rule
/// was broken without a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g. an e-mail without a domain).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// An end date precedes its start date.
    #[error("{end_field} ({end}) must not be before {start_field} ({start})")]
    DateOrder {
        start_field: String,
        start: String,
        end_field: String,
        end: String,
    },
}

impl ValidationError {
    /// Name of the field (or the later field, for date ordering) that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
            ValidationError::DateOrder { end_field, .. } => end_field,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
