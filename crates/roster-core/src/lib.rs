//! # roster-core: Domain Types for the Roster directory
//!
//! This crate holds the entity model of the directory service (employees,
//! positions, departments, sites) as plain data with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Roster Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 API layer (external collaborator)               │   │
//! │  │     request parsing ──► factory/repository calls ──► response   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ roster-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌────────────┐  ┌────────────┐               │   │
//! │  │   │   types    │  │ validation │  │   error    │               │   │
//! │  │   │  Employee  │  │  required  │  │ Validation │               │   │
//! │  │   │  Position  │  │  email     │  │   Error    │               │   │
//! │  │   │  Dept/Site │  │  dates     │  │            │               │   │
//! │  │   └────────────┘  └────────────┘  └────────────┘               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  roster-db (Data-Access Layer)                  │   │
//! │  │      pool, migrations, unit of work, entity repositories        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity types and their enums
//! - [`validation`] - Field and invariant checks run before writes
//! - [`error`] - Validation error type
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use roster_core::validation::validate_employment_dates;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
//!
//! assert!(validate_employment_dates(start, None).is_ok());
//! assert!(validate_employment_dates(start, Some(end)).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted value for short text fields (names, titles, cities).
pub const MAX_NAME_LENGTH: usize = 100;

/// Longest accepted e-mail address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;
