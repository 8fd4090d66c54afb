//! # Typed Filters
//!
//! Equality predicates for `list` and relationship lookups.
//!
//! Each entity has its own filter enum, so a filter on a column the entity
//! does not have cannot be written. All predicates go through
//! [`push_filters`], which numbers bind parameters as it appends them. The
//! count query and the page query are built by the same call and cannot
//! disagree about their parameters.
//!
//! ```text
//! [DepartmentId(d), Status(Active)]
//!        │
//!        ▼
//!  WHERE department_id = $1 AND status = $2
//! ```

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A bindable column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    OptionalText(Option<String>),
    Uuid(Uuid),
    OptionalUuid(Option<Uuid>),
    Date(NaiveDate),
    OptionalDate(Option<NaiveDate>),
}

impl SqlValue {
    /// Appends this value as the next bind parameter.
    pub(crate) fn push_bind(self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            SqlValue::Text(v) => qb.push_bind(v),
            SqlValue::OptionalText(v) => qb.push_bind(v),
            SqlValue::Uuid(v) => qb.push_bind(v),
            SqlValue::OptionalUuid(v) => qb.push_bind(v),
            SqlValue::Date(v) => qb.push_bind(v),
            SqlValue::OptionalDate(v) => qb.push_bind(v),
        };
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        SqlValue::OptionalText(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<Option<Uuid>> for SqlValue {
    fn from(value: Option<Uuid>) -> Self {
        SqlValue::OptionalUuid(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(value: Option<NaiveDate>) -> Self {
        SqlValue::OptionalDate(value)
    }
}

/// One `column = value` predicate.
pub trait Filter: Clone + Send + Sync {
    fn column(&self) -> &'static str;
    fn value(&self) -> SqlValue;
}

/// Appends ` WHERE a = $n AND b = $n+1 ...`; nothing for an empty slice.
pub(crate) fn push_filters<F: Filter>(qb: &mut QueryBuilder<'_, Postgres>, filters: &[F]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(filter.column());
        qb.push(" = ");
        filter.value().push_bind(qb);
    }
}
