//! # Validation Module
//!
//! Field checks applied before a record is written.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer                                                    │
//! │  └── Deserialization, request shape                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by roster-db before INSERT/UPDATE)       │
//! │  ├── Required names, lengths                                           │
//! │  ├── E-mail shape                                                      │
//! │  └── end_date >= start_date                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PostgreSQL                                                   │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (employees.email)                                          │
//! │  └── Foreign keys (position, department, site, manager)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a required short text field (names, titles, cities).
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_NAME_LENGTH`] characters
///
/// ## Example
/// ```rust
/// use roster_core::validation::validate_name;
///
/// assert!(validate_name("first_name", "Ada").is_ok());
/// assert!(validate_name("first_name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_length(field, value, MAX_NAME_LENGTH)
}

/// Validates an optional text field's length.
pub fn validate_max_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an e-mail address.
///
/// Only the shape is checked (one `@`, non-empty local part, dotted domain);
/// uniqueness is enforced by the store. The address is checked as given, so
/// surrounding whitespace is rejected rather than trimmed away.
///
/// ## Example
/// ```rust
/// use roster_core::validation::validate_email;
///
/// assert!(validate_email("ada@x.io").is_ok());
/// assert!(validate_email("ada@localhost").is_err());
/// assert!(validate_email(" ada@x.io").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    validate_max_length("email", email, MAX_EMAIL_LENGTH)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() {
        return Err(invalid("missing local part"));
    }
    if domain.contains('@') {
        return Err(invalid("more than one '@'"));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid("domain must contain a dot-separated name"));
    }

    Ok(())
}

/// Validates the employment period: `end`, when present, must not precede
/// `start`. Equal dates (a one-day engagement) are accepted.
pub fn validate_employment_dates(start: NaiveDate, end: Option<NaiveDate>) -> ValidationResult<()> {
    match end {
        Some(end) if end < start => Err(ValidationError::DateOrder {
            start_field: "start_date".to_string(),
            start: start.to_string(),
            end_field: "end_date".to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("title", "Engineer").is_ok());
        assert!(validate_name("title", "").is_err());
        assert!(validate_name("title", &"A".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(matches!(
            validate_name("title", &"A".repeat(MAX_NAME_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@x.io").is_ok());
        assert!(validate_email("first.last@corp.example.com").is_ok());

        assert!(validate_email("ada").is_err());
        assert!(validate_email("@x.io").is_err());
        assert!(validate_email("ada@@x.io").is_err());
        assert!(validate_email("ada@x.").is_err());
        assert!(validate_email("a da@x.io").is_err());
    }

    #[test]
    fn test_padded_email_is_rejected_not_trimmed() {
        for padded in [" ada@x.io", "ada@x.io ", "\tada@x.io\n"] {
            match validate_email(padded) {
                Err(ValidationError::InvalidFormat { field, reason }) => {
                    assert_eq!(field, "email");
                    assert_eq!(reason, "contains whitespace");
                }
                other => panic!("{padded:?} gave {other:?}"),
            }
        }

        assert!(matches!(
            validate_email("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_employment_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let same = start;
        let before = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();

        assert!(validate_employment_dates(start, None).is_ok());
        assert!(validate_employment_dates(start, Some(same)).is_ok());
        assert!(validate_employment_dates(start, Some(before)).is_err());
    }
}
