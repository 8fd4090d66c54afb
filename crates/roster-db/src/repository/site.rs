//! Table mapping for [`Site`].

use roster_core::{Site, ValidationError};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::filter::{Filter, SqlValue};
use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteFilter {
    Name(String),
    City(String),
}

impl Filter for SiteFilter {
    fn column(&self) -> &'static str {
        match self {
            SiteFilter::Name(_) => "name",
            SiteFilter::City(_) => "city",
        }
    }

    fn value(&self) -> SqlValue {
        match self {
            SiteFilter::Name(v) | SiteFilter::City(v) => v.clone().into(),
        }
    }
}

impl Entity for Site {
    const KIND: &'static str = "Site";
    const TABLE: &'static str = "sites";
    const COLUMNS: &'static str = "id, name, city, address, created_at, updated_at";
    const ORDER_BY: &'static str = "name, id";

    type Filter = SiteFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Site::validate(self)
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", self.name.clone().into()),
            ("city", self.city.clone().into()),
            ("address", self.address.clone().into()),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Site {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            city: row.try_get("city")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
