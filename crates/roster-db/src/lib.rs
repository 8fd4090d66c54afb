//! # roster-db: Data-Access Layer for Roster
//!
//! This crate provides database access for the Roster directory service.
//! It uses PostgreSQL with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Roster Data Flow                                 │
//! │                                                                         │
//! │  API handler (list employees, create site, ...)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     roster-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────────┐   ┌────────────────────┐   ┌─────────────┐  │   │
//! │  │  │ConnectionPool │   │ RepositoryFactory  │   │ Migration   │  │   │
//! │  │  │  (pool.rs)    │◄──│ (unit_of_work.rs)  │   │ Manager     │  │   │
//! │  │  │               │   │  pool | transaction│   │             │  │   │
//! │  │  │ retry/backoff │   │        │           │   │ up / down   │  │   │
//! │  │  │ health, stats │   │        ▼           │   │ version     │  │   │
//! │  │  │               │   │  Repository<E>     │   │ force       │  │   │
//! │  │  └───────────────┘   └────────────────────┘   └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   employees, positions, departments, sites, schema_migrations  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Connection settings from the environment
//! - [`connect`] - Connect attempts with exponential backoff
//! - [`pool`] - Connection pool handle, health checks, statistics
//! - [`context`] - Deadline and cancellation for every call
//! - [`unit_of_work`] - Repository factory bound to pool or transaction
//! - [`repository`] - Entity repositories
//! - [`migrations`] - Versioned schema migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roster_db::{CallContext, ConnectionPool, DatabaseSettings};
//!
//! let settings = DatabaseSettings::from_env()?;
//! let pool = ConnectionPool::initialize(&settings).await?;
//! pool.migrations().run_migrations(&ctx, "migrations/postgres".as_ref()).await?;
//!
//! // Auto-commit per call
//! let ada = pool.factory().employees().get_by_id(&ctx, id).await?;
//!
//! // Several repositories, one transaction
//! let tx = pool.factory().begin_transaction(&ctx).await?;
//! tx.departments().update(&ctx, &department).await?;
//! tx.employees().update(&ctx, &lead).await?;
//! tx.commit(&ctx).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connect;
pub mod context;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DatabaseSettings};
pub use connect::{connect_with_retry, Connector, PgConnector, RetryPolicy, POOL_ACQUIRE_CEILING};
pub use context::CallContext;
pub use error::{DbError, DbResult};
pub use migrations::{
    Migration, MigrationManager, MigrationSource, MigrationState, DEFAULT_MIGRATION_TIMEOUT,
};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use unit_of_work::RepositoryFactory;

// Repository re-exports for convenience
pub use repository::{
    DepartmentFilter, DepartmentRepository, EmployeeFilter, EmployeeRepository, Page,
    PositionFilter, PositionRepository, Repository, SiteFilter, SiteRepository,
};
