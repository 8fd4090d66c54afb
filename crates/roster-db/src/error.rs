//! # Database Error Types
//!
//! Error types for pool, repository, transaction and migration operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)      ValidationError (roster-core)     │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  DbError::from_sqlx(entity, op, e)   DbError::invalid(entity, op, e)   │
//! │       │   ← classifies + adds operation context                         │
//! │       ▼                                                                 │
//! │  DbError (this module)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  API layer maps variants to responses (404, 409, 503, ...)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are converted at the call site with [`DbError::from_sqlx`],
//! so each one names the entity and operation that hit it.

use roster_core::ValidationError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `get_by_id` finds no row
    /// - `update` / `delete` affect zero rows
    ///
    /// This is an expected outcome, not a fault.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A write was rejected, either by domain validation before it was sent
    /// or by a store constraint (unique, foreign key, check, not-null).
    ///
    /// `constraint` names the violated rule: the constraint name reported by
    /// PostgreSQL, or the offending field for domain validation.
    #[error("{operation} {entity} rejected: {message}")]
    Validation {
        entity: &'static str,
        operation: &'static str,
        constraint: Option<String>,
        message: String,
    },

    /// The store is unreachable or unhealthy.
    ///
    /// ## When This Occurs
    /// - Health check query failed or returned an unexpected value
    /// - The pool was closed
    /// - Connection settings could not be turned into connect options
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Pool initialization gave up after the configured number of attempts.
    ///
    /// Terminal: callers must not retry on their own.
    #[error("Could not connect to database after {attempts} attempts: {last}")]
    ConnectRetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<DbError>,
    },

    /// Acquisition or a store operation exceeded its deadline.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// The caller cancelled the operation through its `CallContext`.
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    /// Begin while a transaction is active, commit/rollback without one, or
    /// use of a transaction that already finished.
    #[error("Transaction state error: {0}")]
    TransactionState(String),

    /// The schema was left dirty by a failed migration.
    ///
    /// Fatal: requires operator intervention (`migrate force`), never
    /// retried automatically.
    #[error("Schema is dirty at version {version}: {reason}")]
    MigrationDirty { version: u64, reason: String },

    /// The migration directory is unreadable or malformed.
    #[error("Invalid migration source {path}: {reason}")]
    MigrationSource { path: String, reason: String },

    /// A migration operation failed without leaving the schema dirty
    /// (bookkeeping errors, missing down file, lock failures).
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other store failure, with the operation that hit it.
    #[error("{operation} {entity} failed: {source}")]
    Query {
        entity: &'static str,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Creates a NotFound error for a given entity kind and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps a domain validation failure with operation context.
    pub fn invalid(entity: &'static str, operation: &'static str, err: ValidationError) -> Self {
        DbError::Validation {
            entity,
            operation,
            constraint: Some(err.field().to_string()),
            message: err.to_string(),
        }
    }

    /// Classifies a sqlx error and attaches operation context.
    ///
    /// ## Error Mapping
    /// ```text
    /// Database(unique / fk / check / not-null) → DbError::Validation
    /// PoolTimedOut                             → DbError::Timeout
    /// PoolClosed                               → DbError::ConnectionFailed
    /// Other                                    → DbError::Query
    /// ```
    pub fn from_sqlx(entity: &'static str, operation: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let violated = matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            );
            if violated {
                return DbError::Validation {
                    entity,
                    operation,
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                };
            }
        }

        match err {
            sqlx::Error::PoolTimedOut => DbError::Timeout { operation },
            sqlx::Error::PoolClosed => {
                DbError::ConnectionFailed("connection pool is closed".to_string())
            }
            source => DbError::Query {
                entity,
                operation,
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Validation { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DbError::Timeout { .. })
    }

    pub fn is_transaction_state(&self) -> bool {
        matches!(self, DbError::TransactionState(_))
    }

    pub fn is_migration_dirty(&self) -> bool {
        matches!(self, DbError::MigrationDirty { .. })
    }

    /// True for both a single connection failure and exhausted retries.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::ConnectRetriesExhausted { .. }
        )
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
