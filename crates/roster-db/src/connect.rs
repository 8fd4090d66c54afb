//! # Connection Establishment
//!
//! Bounded, backing-off connection attempts used while the pool is created.
//!
//! ## Retry Timeline (defaults: 5 attempts, 3s initial delay)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  attempt 1 ──✗── sleep 3s ── attempt 2 ──✗── sleep 6s ── attempt 3 ...  │
//! │                                                                         │
//! │  each attempt:  connect ──► SELECT 1 ──► ok?  (both within 5s)          │
//! │                                 │                                       │
//! │                                 └─ failed: close the half-built pool    │
//! │                                                                         │
//! │  attempt 5 ──✗──► ConnectRetriesExhausted { attempts: 5, last }        │
//! │                   (terminal, the caller does not retry)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The network step sits behind [`Connector`] so the policy can be tested
//! against a scripted connector with a paused clock.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::DatabaseSettings;
use crate::error::{DbError, DbResult};
use crate::pool::PoolConfig;

// =============================================================================
// Retry Policy
// =============================================================================

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts. Zero is treated as one.
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            initial_delay,
        }
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Wait after the failed attempt with 0-based index `attempt`:
    /// `initial_delay * 2^attempt`, saturating at `Duration::MAX`.
    ///
    /// ## Example
    /// ```rust
    /// use roster_db::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(5, Duration::from_secs(3));
    /// assert_eq!(policy.delay_for(0), Duration::from_secs(3));
    /// assert_eq!(policy.delay_for(2), Duration::from_secs(12));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
    }
}

impl From<&PoolConfig> for RetryPolicy {
    fn from(config: &PoolConfig) -> Self {
        RetryPolicy::new(config.max_retries, config.initial_retry_delay)
    }
}

// =============================================================================
// Connector
// =============================================================================

/// One connection attempt: open a pool, prove it is alive, or tear it down.
#[async_trait]
pub trait Connector: Send + Sync {
    type Pool: Send + Sync;

    async fn connect(&self) -> DbResult<Self::Pool>;

    /// Round-trip check on a freshly opened pool.
    async fn verify(&self, pool: &Self::Pool) -> DbResult<()>;

    /// Releases a pool that failed verification.
    async fn discard(&self, pool: Self::Pool);
}

/// Runs up to `policy.attempts()` connection attempts, each bounded by
/// `attempt_timeout`, sleeping `policy.delay_for(i)` after failed attempt `i`.
pub async fn connect_with_retry<C>(
    connector: &C,
    policy: RetryPolicy,
    attempt_timeout: Duration,
) -> DbResult<C::Pool>
where
    C: Connector,
{
    let attempts = policy.attempts();
    let mut last_error = None;

    for attempt in 0..attempts {
        match attempt_once(connector, attempt_timeout).await {
            Ok(pool) => {
                if attempt > 0 {
                    info!(attempt = attempt + 1, "Database connection established after retry");
                }
                return Ok(pool);
            }
            Err(err) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    error = %err,
                    "Database connection attempt failed"
                );
                last_error = Some(err);
            }
        }

        if attempt + 1 < attempts {
            let delay = policy.delay_for(attempt);
            debug!(delay_ms = delay.as_millis() as u64, "Waiting before next connection attempt");
            tokio::time::sleep(delay).await;
        }
    }

    let last = last_error
        .unwrap_or_else(|| DbError::ConnectionFailed("no connection attempt was made".to_string()));
    Err(DbError::ConnectRetriesExhausted {
        attempts,
        last: Box::new(last),
    })
}

async fn attempt_once<C>(connector: &C, attempt_timeout: Duration) -> DbResult<C::Pool>
where
    C: Connector,
{
    let deadline = Instant::now() + attempt_timeout;

    let pool = tokio::time::timeout_at(deadline, connector.connect())
        .await
        .map_err(|_| DbError::Timeout {
            operation: "connect",
        })??;

    match tokio::time::timeout_at(deadline, connector.verify(&pool)).await {
        Ok(Ok(())) => Ok(pool),
        Ok(Err(err)) => {
            connector.discard(pool).await;
            Err(err)
        }
        Err(_) => {
            connector.discard(pool).await;
            Err(DbError::Timeout {
                operation: "health_check",
            })
        }
    }
}

// =============================================================================
// PostgreSQL Connector
// =============================================================================

/// Upper bound sqlx itself puts on a checkout. Callers bound acquisition
/// through their [`CallContext`](crate::CallContext), so this only has to
/// outlast any realistic deadline.
pub const POOL_ACQUIRE_CEILING: Duration = Duration::from_secs(60 * 60);

/// Opens sqlx `PgPool`s with the configured bounds.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    config: PoolConfig,
}

impl PgConnector {
    pub fn new(settings: &DatabaseSettings) -> DbResult<Self> {
        let options = settings
            .connect_options()
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(PgConnector {
            options,
            config: settings.pool.clone(),
        })
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .max_lifetime(Some(self.config.max_lifetime))
            .idle_timeout(Some(self.config.max_idle_time))
            .acquire_timeout(POOL_ACQUIRE_CEILING)
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Pool = PgPool;

    async fn connect(&self) -> DbResult<PgPool> {
        self.pool_options()
            .connect_with(self.options.clone())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))
    }

    async fn verify(&self, pool: &PgPool) -> DbResult<()> {
        ping(pool).await
    }

    async fn discard(&self, pool: PgPool) {
        pool.close().await;
    }
}

/// `SELECT 1` round trip; anything but `1` counts as unhealthy.
pub(crate) async fn ping(pool: &PgPool) -> DbResult<()> {
    let value: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::ConnectionFailed(format!("health check failed: {e}")))?;

    if value != 1 {
        return Err(DbError::ConnectionFailed(format!(
            "health check returned {value}, expected 1"
        )));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
