//! Table mapping for [`Position`].

use roster_core::{Position, ValidationError};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::filter::{Filter, SqlValue};
use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionFilter {
    Title(String),
}

impl Filter for PositionFilter {
    fn column(&self) -> &'static str {
        match self {
            PositionFilter::Title(_) => "title",
        }
    }

    fn value(&self) -> SqlValue {
        match self {
            PositionFilter::Title(title) => title.clone().into(),
        }
    }
}

impl Entity for Position {
    const KIND: &'static str = "Position";
    const TABLE: &'static str = "positions";
    const COLUMNS: &'static str =
        "id, title, description, requirements, created_at, updated_at";
    const ORDER_BY: &'static str = "title, id";

    type Filter = PositionFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Position::validate(self)
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("requirements", self.requirements.clone().into()),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Position {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            requirements: row.try_get("requirements")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
