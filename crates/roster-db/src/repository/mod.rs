//! # Repository Module
//!
//! CRUD, filtered listing and relationship lookups for the directory entities.
//!
//! ## One Engine, Four Descriptors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  factory.employees()        factory.sites()        ...                 │
//! │       │                          │                                      │
//! │       ▼                          ▼                                      │
//! │  Repository<'_, Employee>   Repository<'_, Site>                       │
//! │  ├── create / get_by_id / update / delete / list   (generic engine)    │
//! │  └── get_by_manager / get_by_department            (Employee only)     │
//! │       │                                                                 │
//! │       │  SQL built from the entity's descriptor:                       │
//! │       │  KIND, TABLE, COLUMNS, ORDER_BY, values(), from_row()          │
//! │       ▼                                                                 │
//! │  factory.lease(ctx) → pooled connection or the factory's transaction   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`EmployeeRepository`] - people, plus manager/department lookups
//! - [`PositionRepository`] - job positions
//! - [`DepartmentRepository`] - organizational units
//! - [`SiteRepository`] - office locations

pub mod department;
pub mod employee;
pub mod filter;
pub mod position;
pub mod site;

use std::marker::PhantomData;

use roster_core::{Department, Employee, Position, Site, ValidationError};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::context::CallContext;
use crate::error::{DbError, DbResult};
use crate::unit_of_work::RepositoryFactory;

pub use department::DepartmentFilter;
pub use employee::EmployeeFilter;
pub use filter::{Filter, SqlValue};
pub use position::PositionFilter;
pub use site::SiteFilter;

pub type EmployeeRepository<'f> = Repository<'f, Employee>;
pub type PositionRepository<'f> = Repository<'f, Position>;
pub type DepartmentRepository<'f> = Repository<'f, Department>;
pub type SiteRepository<'f> = Repository<'f, Site>;

// =============================================================================
// Entity Descriptor
// =============================================================================

/// How an entity maps onto its table.
pub trait Entity: Sized + Send + Sync + Unpin {
    /// Name used in errors and log fields ("Employee").
    const KIND: &'static str;
    const TABLE: &'static str;
    /// Select list, in the order `from_row` expects.
    const COLUMNS: &'static str;
    /// Natural ordering, always ending with `id`.
    const ORDER_BY: &'static str;

    type Filter: Filter;

    fn id(&self) -> Uuid;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Writable columns and their values. Identity and audit columns are
    /// store-assigned and never listed.
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;
}

/// One page of a listing plus the number of rows matching the filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
}

// =============================================================================
// Generic Repository
// =============================================================================

/// Repository for entity kind `E`, executing through its factory's context.
pub struct Repository<'f, E> {
    factory: &'f RepositoryFactory,
    _entity: PhantomData<fn() -> E>,
}

impl<'f, E: Entity> Repository<'f, E> {
    pub(crate) fn new(factory: &'f RepositoryFactory) -> Self {
        Repository {
            factory,
            _entity: PhantomData,
        }
    }

    /// Validates and inserts `entity`, returning the store-generated id.
    ///
    /// `id`, `created_at` and `updated_at` on the argument are ignored.
    pub async fn create(&self, ctx: &CallContext, entity: &E) -> DbResult<Uuid> {
        entity
            .validate()
            .map_err(|e| DbError::invalid(E::KIND, "create", e))?;

        let values = entity.values();
        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", E::TABLE));
        for (i, (column, _)) in values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in values.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            value.push_bind(&mut qb);
        }
        qb.push(") RETURNING id");

        let mut lease = self.factory.lease(ctx).await?;
        let id: Uuid = ctx
            .run("create", async {
                qb.build_query_scalar::<Uuid>()
                    .fetch_one(lease.connection()?)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "create", e))
            })
            .await?;

        debug!(entity = E::KIND, %id, "Created");
        Ok(id)
    }

    /// Fetches one record.
    ///
    /// ## Returns
    /// * `Ok(E)` - Record found
    /// * `Err(DbError::NotFound)` - No record with this id
    pub async fn get_by_id(&self, ctx: &CallContext, id: Uuid) -> DbResult<E> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            E::COLUMNS,
            E::TABLE
        ));
        qb.push_bind(id);

        let mut lease = self.factory.lease(ctx).await?;
        let row = ctx
            .run("get_by_id", async {
                qb.build()
                    .fetch_optional(lease.connection()?)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "get_by_id", e))
            })
            .await?;

        match row {
            Some(row) => E::from_row(&row).map_err(|e| DbError::from_sqlx(E::KIND, "get_by_id", e)),
            None => Err(DbError::not_found(E::KIND, id)),
        }
    }

    /// Overwrites every writable column of the record with `entity.id()`.
    ///
    /// `updated_at` is refreshed by the store.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No row was affected
    pub async fn update(&self, ctx: &CallContext, entity: &E) -> DbResult<()> {
        entity
            .validate()
            .map_err(|e| DbError::invalid(E::KIND, "update", e))?;

        let id = entity.id();
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", E::TABLE));
        for (column, value) in entity.values() {
            qb.push(column);
            qb.push(" = ");
            value.push_bind(&mut qb);
            qb.push(", ");
        }
        qb.push("updated_at = NOW() WHERE id = ");
        qb.push_bind(id);

        let mut lease = self.factory.lease(ctx).await?;
        let result = ctx
            .run("update", async {
                qb.build()
                    .execute(lease.connection()?)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "update", e))
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::KIND, id));
        }

        debug!(entity = E::KIND, %id, "Updated");
        Ok(())
    }

    /// Removes a record.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No row was affected
    pub async fn delete(&self, ctx: &CallContext, id: Uuid) -> DbResult<()> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE id = ", E::TABLE));
        qb.push_bind(id);

        let mut lease = self.factory.lease(ctx).await?;
        let result = ctx
            .run("delete", async {
                qb.build()
                    .execute(lease.connection()?)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "delete", e))
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::KIND, id));
        }

        debug!(entity = E::KIND, %id, "Deleted");
        Ok(())
    }

    /// One page of records matching every filter, in the entity's natural
    /// order, plus the total number of matches.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let page = factory
    ///     .employees()
    ///     .list(&ctx, &[EmployeeFilter::Status(EmployeeStatus::Active)], 20, 40)
    ///     .await?;
    /// println!("{} of {}", page.items.len(), page.total);
    /// ```
    pub async fn list(
        &self,
        ctx: &CallContext,
        filters: &[E::Filter],
        limit: u32,
        offset: u32,
    ) -> DbResult<Page<E>> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        filter::push_filters(&mut count_qb, filters);

        let mut page_qb = select_where::<E>(filters);
        page_qb.push(" LIMIT ");
        page_qb.push_bind(i64::from(limit));
        page_qb.push(" OFFSET ");
        page_qb.push_bind(i64::from(offset));

        let mut lease = self.factory.lease(ctx).await?;
        let (total, rows) = ctx
            .run("list", async {
                let conn = lease.connection()?;
                let total: i64 = count_qb
                    .build_query_scalar::<i64>()
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "list", e))?;
                let rows = page_qb
                    .build()
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, "list", e))?;
                Ok((total, rows))
            })
            .await?;

        let items = map_rows::<E>(&rows, "list")?;
        debug!(entity = E::KIND, total, returned = items.len(), "Listed");

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    /// Every record matching the filters, unpaginated, in natural order.
    pub(crate) async fn fetch_where(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        filters: &[E::Filter],
    ) -> DbResult<Vec<E>> {
        let mut qb = select_where::<E>(filters);

        let mut lease = self.factory.lease(ctx).await?;
        let rows = ctx
            .run(operation, async {
                qb.build()
                    .fetch_all(lease.connection()?)
                    .await
                    .map_err(|e| DbError::from_sqlx(E::KIND, operation, e))
            })
            .await?;

        map_rows::<E>(&rows, operation)
    }
}

/// `SELECT columns FROM table [WHERE ...] ORDER BY ...`
fn select_where<E: Entity>(filters: &[E::Filter]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", E::COLUMNS, E::TABLE));
    filter::push_filters(&mut qb, filters);
    qb.push(" ORDER BY ");
    qb.push(E::ORDER_BY);
    qb
}

fn map_rows<E: Entity>(rows: &[PgRow], operation: &'static str) -> DbResult<Vec<E>> {
    rows.iter()
        .map(|row| E::from_row(row).map_err(|e| DbError::from_sqlx(E::KIND, operation, e)))
        .collect()
}

/// Decodes a text column into a type parsed with `FromStr`.
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    use sqlx::Row;

    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: ValidationError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_orders_by_natural_key_then_id() {
        let qb = select_where::<Employee>(&[EmployeeFilter::DepartmentId(Uuid::nil())]);
        let sql = qb.sql();

        assert!(sql.starts_with("SELECT id, first_name"));
        assert!(sql.contains(" FROM employees WHERE department_id = $1 ORDER BY "));
        assert!(sql.ends_with("last_name, first_name, id"));
    }

    #[test]
    fn test_every_ordering_ends_with_id() {
        for order in [
            Employee::ORDER_BY,
            Position::ORDER_BY,
            Department::ORDER_BY,
            Site::ORDER_BY,
        ] {
            assert!(order.ends_with(", id"), "{order}");
        }
    }
}
