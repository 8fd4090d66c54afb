//! # Connection Pool Management
//!
//! Pool creation, acquisition, health checking and statistics for PostgreSQL.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Process startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DatabaseSettings::from_env() ← host, credentials, PoolConfig          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConnectionPool::initialize(&settings).await                           │
//! │       │   ← connect_with_retry (backoff, SELECT 1 per attempt)         │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │               PgPool                     │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │  min..=max connections    │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  recycled after lifetime  │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │  or idle timeout          │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ cloned handle passed to every dependent                        │
//! │       ▼                                                                 │
//! │  pool.factory()     → RepositoryFactory (auto-commit)                  │
//! │  pool.migrations()  → MigrationManager                                 │
//! │  pool.spawn_health_monitor() → periodic SELECT 1                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! There is no process-wide pool. The handle is created once at startup and
//! cloned into whatever needs it; clones share the same underlying pool.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::DatabaseSettings;
use crate::connect::{self, connect_with_retry, Connector, PgConnector, RetryPolicy};
use crate::context::CallContext;
use crate::error::{DbError, DbResult};
use crate::migrations::MigrationManager;
use crate::unit_of_work::RepositoryFactory;

/// A connection checked out of the pool. Returned to the pool when dropped.
pub type PooledConnection = PoolConnection<Postgres>;

/// Bound applied to a health check whose context has no deadline.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Pool sizing, recycling and connect-retry settings.
///
/// ## Example
/// ```rust
/// use roster_db::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::default()
///     .max_connections(20)
///     .min_connections(4)
///     .connect_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    /// Default: 10
    pub max_connections: u32,

    /// Minimum number of connections kept open.
    /// Default: 2
    pub min_connections: u32,

    /// Connections older than this are closed instead of reused.
    /// Default: 1 hour
    pub max_lifetime: Duration,

    /// Idle connections above the minimum are closed after this long.
    /// Default: 30 minutes
    pub max_idle_time: Duration,

    /// Period of the background health monitor.
    /// Default: 1 minute
    pub health_check_interval: Duration,

    /// Bound on each connect attempt, and the acquire timeout used when the
    /// caller's context has no deadline.
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Connect attempts made by `initialize`. Zero is treated as one.
    /// Default: 5
    pub max_retries: u32,

    /// Wait after the first failed attempt; doubles after each failure.
    /// Default: 3 seconds
    pub initial_retry_delay: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_connections: 10,
            min_connections: 2,
            max_lifetime: Duration::from_secs(60 * 60),
            max_idle_time: Duration::from_secs(30 * 60),
            health_check_interval: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
            max_retries: 5,
            initial_retry_delay: Duration::from_secs(3),
        }
    }
}

impl PoolConfig {
    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn max_idle_time(mut self, idle: Duration) -> Self {
        self.max_idle_time = idle;
        self
    }

    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the retry count and the first backoff delay.
    pub fn retries(mut self, max_retries: u32, initial_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_retry_delay = initial_delay;
        self
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Connections currently checked out.
    pub active: u32,
    /// Open connections waiting in the pool.
    pub idle: u32,
    /// `active + idle`.
    pub total: u32,
    /// Configured upper bound.
    pub max: u32,
}

// =============================================================================
// Connection Pool
// =============================================================================

/// Shared handle to the PostgreSQL pool.
///
/// ## Usage
/// ```rust,ignore
/// let settings = DatabaseSettings::from_env()?;
/// let pool = ConnectionPool::initialize(&settings).await?;
/// let _monitor = pool.spawn_health_monitor();
///
/// let employees = pool.factory().employees();
/// let page = employees.list(&ctx, &[], 20, 0).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: PgPool,
    config: PoolConfig,
}

impl ConnectionPool {
    /// Creates the pool, retrying with backoff until it answers `SELECT 1`.
    ///
    /// ## Returns
    /// * `Ok(ConnectionPool)` - Ready-to-use pool
    /// * `Err(DbError::ConnectRetriesExhausted)` - Every attempt failed
    pub async fn initialize(settings: &DatabaseSettings) -> DbResult<Self> {
        info!(
            target_db = %settings.target(),
            max_connections = settings.pool.max_connections,
            min_connections = settings.pool.min_connections,
            "Initializing database connection pool"
        );

        let connector = PgConnector::new(settings)?;
        Self::initialize_with(&connector, settings.pool.clone()).await
    }

    /// Same as [`initialize`](Self::initialize) with a caller-supplied connector.
    pub async fn initialize_with<C>(connector: &C, config: PoolConfig) -> DbResult<Self>
    where
        C: Connector<Pool = PgPool>,
    {
        let pool = connect_with_retry(
            connector,
            RetryPolicy::from(&config),
            config.connect_timeout,
        )
        .await?;

        info!(max_connections = config.max_connections, "Database pool created");

        Ok(ConnectionPool { pool, config })
    }

    /// Wraps an already-open sqlx pool.
    pub fn from_pool(pool: PgPool, config: PoolConfig) -> Self {
        ConnectionPool { pool, config }
    }

    /// Checks out a connection, waiting until one is free or the context's
    /// deadline passes. A context without a deadline waits at most
    /// `connect_timeout`.
    pub async fn acquire(&self, ctx: &CallContext) -> DbResult<PooledConnection> {
        ctx.or_timeout(self.config.connect_timeout)
            .run("acquire", async {
                self.pool
                    .acquire()
                    .await
                    .map_err(|e| DbError::from_sqlx("connection", "acquire", e))
            })
            .await
    }

    /// Returns a connection to the pool. Dropping it has the same effect.
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
        debug!(idle = self.pool.num_idle(), "Connection released");
    }

    /// Runs `SELECT 1` and expects `1` back, within the context deadline or
    /// [`DEFAULT_HEALTH_CHECK_TIMEOUT`].
    pub async fn health_check(&self, ctx: &CallContext) -> DbResult<()> {
        ctx.or_timeout(DEFAULT_HEALTH_CHECK_TIMEOUT)
            .run("health_check", connect::ping(&self.pool))
            .await
    }

    pub fn stats(&self) -> PoolStats {
        let total = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX).min(total);

        PoolStats {
            active: total - idle,
            idle,
            total,
            max: self.config.max_connections,
        }
    }

    /// Closes every connection. Later acquisitions fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The underlying sqlx pool, for queries not covered by repositories.
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Starts a task that health-checks the pool every
    /// `health_check_interval` and stops once the pool is closed.
    pub fn spawn_health_monitor(&self) -> JoinHandle<()> {
        let pool = self.clone();
        let period = self.config.health_check_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the pool was just verified.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if pool.is_closed() {
                    debug!("Pool closed, stopping health monitor");
                    break;
                }

                match pool.health_check(&CallContext::background()).await {
                    Ok(()) => {
                        let stats = pool.stats();
                        debug!(active = stats.active, idle = stats.idle, "Database health check ok");
                    }
                    Err(e) => warn!(error = %e, "Database health check failed"),
                }
            }
        })
    }

    /// A repository factory bound to this pool (auto-commit per call).
    pub fn factory(&self) -> RepositoryFactory {
        RepositoryFactory::new(self.clone())
    }

    pub fn migrations(&self) -> MigrationManager {
        MigrationManager::new(self.clone())
    }
}

#[cfg(test)]
impl ConnectionPool {
    /// A pool that never connects until used; for tests that must not touch
    /// the network.
    pub(crate) fn lazy_for_tests() -> Self {
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("roster")
            .database("roster");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .min_connections(0)
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(options);

        ConnectionPool::from_pool(pool, PoolConfig::default().max_connections(2).min_connections(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
