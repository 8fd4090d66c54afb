//! # Domain Types
//!
//! Entity types of the directory service.
//!
//! ## Type Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Directory Entities                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Position     │   │   Department    │   │      Site       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title          │   │  name           │   │  name, city     │       │
//! │  └────────▲────────┘   │  lead_id ───┐   │   └────────▲────────┘       │
//! │           │            └──────▲──────┼───┘            │                │
//! │           │                   │      │ (soft ref)     │                │
//! │  ┌────────┴───────────────────┴──────▼────────────────┴────────┐       │
//! │  │                          Employee                           │       │
//! │  │  position_id, department_id, site_id   manager_id ──┐       │       │
//! │  │  start_date, end_date?, status                      │       │       │
//! │  └─────────────────────────────────────────────────▲───┘       │       │
//! │                                                    └───────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity and Audit Fields
//! `id`, `created_at` and `updated_at` are assigned by the store. Values held
//! in these fields when a record is passed to `create` are ignored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::validation;

// =============================================================================
// Employee Status
// =============================================================================

/// Employment status of an employee.
///
/// Transitions between states are the caller's business; this layer stores
/// whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    Terminated,
}

impl EmployeeStatus {
    pub const ALL: [EmployeeStatus; 3] = [
        EmployeeStatus::Active,
        EmployeeStatus::Inactive,
        EmployeeStatus::Terminated,
    ];

    /// Storage representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: EmployeeStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Employment Type
// =============================================================================

/// Contract type of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contractor,
    Intern,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contractor,
        EmploymentType::Intern,
    ];

    /// Storage representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contractor => "contractor",
            EmploymentType::Intern => "intern",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmploymentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "employment_type".to_string(),
                allowed: EmploymentType::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Store-generated identifier.
    pub id: Uuid,

    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,

    /// Name shown in listings, usually "First Last".
    pub display_name: String,

    /// Work e-mail, unique across the directory.
    pub email: String,
    pub address: Option<String>,

    pub position_id: Uuid,
    pub department_id: Uuid,
    pub site_id: Uuid,

    /// Direct manager, if any (another employee).
    pub manager_id: Option<Uuid>,

    pub employment_type: EmploymentType,

    /// First day of employment.
    pub start_date: NaiveDate,

    /// Last day of employment; absent while employed.
    pub end_date: Option<NaiveDate>,

    pub status: EmployeeStatus,
    pub profile_picture_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Builds a display name from the name parts ("Ada Lovelace").
    pub fn compose_display_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name.trim(), last_name.trim())
            .trim()
            .to_string()
    }

    /// Whether the employee is employed on the given day.
    pub fn is_employed_on(&self, day: NaiveDate) -> bool {
        day >= self.start_date && self.end_date.map_or(true, |end| day <= end)
    }

    /// Checks field rules and the `end_date >= start_date` invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("first_name", &self.first_name)?;
        validation::validate_name("last_name", &self.last_name)?;
        validation::validate_name("display_name", &self.display_name)?;
        if let Some(middle) = &self.middle_name {
            validation::validate_max_length("middle_name", middle, crate::MAX_NAME_LENGTH)?;
        }
        validation::validate_email(&self.email)?;
        validation::validate_employment_dates(self.start_date, self.end_date)?;
        Ok(())
    }
}

// =============================================================================
// Position
// =============================================================================

/// A job position (e.g. "Software Engineer").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("title", &self.title)
    }
}

// =============================================================================
// Department
// =============================================================================

/// An organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Employee leading the department. Not a hard foreign key: a department
    /// may briefly reference a lead that is being created in the same batch.
    pub lead_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("name", &self.name)
    }
}

// =============================================================================
// Site
// =============================================================================

/// A physical office location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("name", &self.name)?;
        validation::validate_name("city", &self.city)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::nil(),
            first_name: "Ada".to_string(),
            middle_name: None,
            last_name: "Lovelace".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: "ada@x.io".to_string(),
            address: None,
            position_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            manager_id: None,
            employment_type: EmploymentType::FullTime,
            start_date: date(2024, 1, 1),
            end_date: None,
            status: EmployeeStatus::Active,
            profile_picture_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in EmployeeStatus::ALL {
            assert_eq!(status.as_str().parse::<EmployeeStatus>().unwrap(), status);
        }
        assert!("retired".parse::<EmployeeStatus>().is_err());
    }

    #[test]
    fn test_employment_type_parse() {
        assert_eq!(
            "part_time".parse::<EmploymentType>().unwrap(),
            EmploymentType::PartTime
        );
        let err = "freelance".parse::<EmploymentType>().unwrap_err();
        assert_eq!(err.field(), "employment_type");
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&EmployeeStatus::Terminated).unwrap();
        assert_eq!(json, "\"terminated\"");
    }

    #[test]
    fn test_valid_employee() {
        assert!(employee().validate().is_ok());
    }

    #[test]
    fn test_end_date_before_start_is_rejected() {
        let mut e = employee();
        e.end_date = Some(date(2023, 12, 31));
        assert!(matches!(
            e.validate(),
            Err(ValidationError::DateOrder { .. })
        ));

        e.end_date = Some(date(2024, 1, 1));
        assert!(e.validate().is_ok());
    }

    #[test]
    fn test_is_employed_on() {
        let mut e = employee();
        assert!(e.is_employed_on(date(2030, 6, 1)));
        assert!(!e.is_employed_on(date(2023, 6, 1)));

        e.end_date = Some(date(2024, 3, 31));
        assert!(e.is_employed_on(date(2024, 3, 31)));
        assert!(!e.is_employed_on(date(2024, 4, 1)));
    }

    #[test]
    fn test_compose_display_name() {
        assert_eq!(
            Employee::compose_display_name(" Grace ", "Hopper"),
            "Grace Hopper"
        );
    }
}
