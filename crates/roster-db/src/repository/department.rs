//! Table mapping for [`Department`].
//!
//! `lead_id` is stored without a foreign key, so a department can name a
//! lead that is created later in the same batch.

use roster_core::{Department, ValidationError};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::filter::{Filter, SqlValue};
use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentFilter {
    Name(String),
    LeadId(Uuid),
}

impl Filter for DepartmentFilter {
    fn column(&self) -> &'static str {
        match self {
            DepartmentFilter::Name(_) => "name",
            DepartmentFilter::LeadId(_) => "lead_id",
        }
    }

    fn value(&self) -> SqlValue {
        match self {
            DepartmentFilter::Name(name) => name.clone().into(),
            DepartmentFilter::LeadId(id) => (*id).into(),
        }
    }
}

impl Entity for Department {
    const KIND: &'static str = "Department";
    const TABLE: &'static str = "departments";
    const COLUMNS: &'static str = "id, name, description, lead_id, created_at, updated_at";
    const ORDER_BY: &'static str = "name, id";

    type Filter = DepartmentFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Department::validate(self)
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("lead_id", self.lead_id.into()),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Department {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            lead_id: row.try_get("lead_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lead_binds_null() {
        let department = Department {
            id: Uuid::nil(),
            name: "Engineering".to_string(),
            description: None,
            lead_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let values = department.values();
        assert_eq!(values[2], ("lead_id", SqlValue::OptionalUuid(None)));
        assert_eq!(values[1], ("description", SqlValue::OptionalText(None)));
    }
}
