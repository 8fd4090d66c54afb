//! # Employee Repository
//!
//! Table mapping for [`Employee`] plus the manager and department lookups.
//!
//! ## Reporting Lines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 Grace (manager_id = NULL)                               │
//! │                   │                                                     │
//! │          ┌────────┴────────┐                                           │
//! │          ▼                 ▼                                            │
//! │        Ada               Alan        ← get_by_manager(grace.id)         │
//! │     (Engineering)    (Engineering)   ← get_by_department(eng.id)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use roster_core::{Employee, EmployeeStatus, EmploymentType, ValidationError};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::filter::{Filter, SqlValue};
use super::{parse_column, Entity, Repository};
use crate::context::CallContext;
use crate::error::DbResult;

/// Equality filters accepted by `employees().list(..)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeFilter {
    PositionId(Uuid),
    DepartmentId(Uuid),
    SiteId(Uuid),
    ManagerId(Uuid),
    Status(EmployeeStatus),
    EmploymentType(EmploymentType),
    Email(String),
}

impl Filter for EmployeeFilter {
    fn column(&self) -> &'static str {
        match self {
            EmployeeFilter::PositionId(_) => "position_id",
            EmployeeFilter::DepartmentId(_) => "department_id",
            EmployeeFilter::SiteId(_) => "site_id",
            EmployeeFilter::ManagerId(_) => "manager_id",
            EmployeeFilter::Status(_) => "status",
            EmployeeFilter::EmploymentType(_) => "employment_type",
            EmployeeFilter::Email(_) => "email",
        }
    }

    fn value(&self) -> SqlValue {
        match self {
            EmployeeFilter::PositionId(id)
            | EmployeeFilter::DepartmentId(id)
            | EmployeeFilter::SiteId(id)
            | EmployeeFilter::ManagerId(id) => (*id).into(),
            EmployeeFilter::Status(status) => status.as_str().into(),
            EmployeeFilter::EmploymentType(kind) => kind.as_str().into(),
            EmployeeFilter::Email(email) => email.clone().into(),
        }
    }
}

impl Entity for Employee {
    const KIND: &'static str = "Employee";
    const TABLE: &'static str = "employees";
    const COLUMNS: &'static str = "id, first_name, middle_name, last_name, display_name, \
        email, address, position_id, department_id, site_id, manager_id, employment_type, \
        start_date, end_date, status, profile_picture_url, created_at, updated_at";
    const ORDER_BY: &'static str = "last_name, first_name, id";

    type Filter = EmployeeFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Employee::validate(self)
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("first_name", self.first_name.clone().into()),
            ("middle_name", self.middle_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("display_name", self.display_name.clone().into()),
            ("email", self.email.clone().into()),
            ("address", self.address.clone().into()),
            ("position_id", self.position_id.into()),
            ("department_id", self.department_id.into()),
            ("site_id", self.site_id.into()),
            ("manager_id", self.manager_id.into()),
            ("employment_type", self.employment_type.as_str().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("status", self.status.as_str().into()),
            ("profile_picture_url", self.profile_picture_url.clone().into()),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Employee {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            middle_name: row.try_get("middle_name")?,
            last_name: row.try_get("last_name")?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            position_id: row.try_get("position_id")?,
            department_id: row.try_get("department_id")?,
            site_id: row.try_get("site_id")?,
            manager_id: row.try_get("manager_id")?,
            employment_type: parse_column(row, "employment_type")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status: parse_column(row, "status")?,
            profile_picture_url: row.try_get("profile_picture_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Repository<'_, Employee> {
    /// Direct reports of `manager_id`, unpaginated.
    pub async fn get_by_manager(&self, ctx: &CallContext, manager_id: Uuid) -> DbResult<Vec<Employee>> {
        self.fetch_where(ctx, "get_by_manager", &[EmployeeFilter::ManagerId(manager_id)])
            .await
    }

    /// Everyone in `department_id`, unpaginated.
    pub async fn get_by_department(
        &self,
        ctx: &CallContext,
        department_id: Uuid,
    ) -> DbResult<Vec<Employee>> {
        self.fetch_where(
            ctx,
            "get_by_department",
            &[EmployeeFilter::DepartmentId(department_id)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_filters_bind_storage_strings() {
        assert_eq!(
            EmployeeFilter::Status(EmployeeStatus::Terminated).value(),
            SqlValue::Text("terminated".to_string())
        );
        assert_eq!(
            EmployeeFilter::EmploymentType(EmploymentType::PartTime).value(),
            SqlValue::Text("part_time".to_string())
        );
        assert_eq!(EmployeeFilter::ManagerId(Uuid::nil()).column(), "manager_id");
    }

    fn ada() -> Employee {
        Employee {
            id: Uuid::new_v4(),
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
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            status: EmployeeStatus::Active,
            profile_picture_url: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn bound(employee: &Employee, column: &str) -> Option<SqlValue> {
        employee
            .values()
            .into_iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_writable_columns_exclude_store_assigned_fields() {
        let values = ada().values();
        let columns: Vec<_> = values.iter().map(|(c, _)| *c).collect();

        assert!(!columns.contains(&"id"));
        assert!(!columns.contains(&"created_at"));
        assert!(!columns.contains(&"updated_at"));
        assert_eq!(columns.len(), 15);

        // Every writable column is also selected.
        for column in &columns {
            assert!(Employee::COLUMNS.contains(column), "{column}");
        }

        assert_eq!(bound(&ada(), "manager_id"), Some(SqlValue::OptionalUuid(None)));
    }

    #[test]
    fn test_fields_are_bound_exactly_as_given() {
        let mut employee = ada();
        employee.email = "Ada.Lovelace@X.io".to_string();
        employee.middle_name = Some("King".to_string());
        employee.address = Some("12 St James's Square".to_string());

        assert_eq!(Entity::validate(&employee), Ok(()));
        assert_eq!(
            bound(&employee, "email"),
            Some(SqlValue::Text("Ada.Lovelace@X.io".to_string()))
        );
        assert_eq!(
            bound(&employee, "middle_name"),
            Some(SqlValue::OptionalText(Some("King".to_string())))
        );
        assert_eq!(
            bound(&employee, "address"),
            Some(SqlValue::OptionalText(Some("12 St James's Square".to_string())))
        );
    }

    #[test]
    fn test_padded_email_never_reaches_the_store() {
        let mut employee = ada();
        employee.email = " ada@x.io ".to_string();

        assert!(Entity::validate(&employee).is_err());
    }
}
