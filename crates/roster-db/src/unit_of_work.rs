//! # Unit of Work
//!
//! Binds entity repositories to one execution context: the shared pool
//! (auto-commit per call) or a single open transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Factory States                            │
//! │                                                                         │
//! │  pool.factory()                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  begin_transaction  ┌──────────────────────┐         │
//! │  │ Pool-bound   │ ──────────────────► │ Transaction-bound    │         │
//! │  │ (auto-commit)│   (new factory)     │ (active)             │         │
//! │  └──────────────┘                     └──────────┬───────────┘         │
//! │   commit/rollback → TransactionState             │ commit / rollback   │
//! │                                                  ▼                     │
//! │                                       ┌──────────────────────┐         │
//! │                                       │ Finished             │         │
//! │                                       │ every call →         │         │
//! │                                       │ TransactionState     │         │
//! │                                       └──────────────────────┘         │
//! │                                                                         │
//! │  Dropped while active → rolled back, warning logged                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let tx = pool.factory().begin_transaction(&ctx).await?;
//! let site_id = tx.sites().create(&ctx, &site).await?;
//! employee.site_id = site_id;
//! tx.employees().create(&ctx, &employee).await?;
//! tx.commit(&ctx).await?; // both rows or neither
//! ```

use sqlx::postgres::PgConnection;
use sqlx::{Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::error::{DbError, DbResult};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::repository::{
    DepartmentRepository, EmployeeRepository, PositionRepository, Repository, SiteRepository,
};

type TransactionSlot = Option<Transaction<'static, Postgres>>;

/// Where a factory's statements run.
enum ExecutionContext {
    /// A fresh pooled connection per call.
    Pool,
    /// The factory's own transaction; `None` once committed or rolled back.
    Transaction(Mutex<TransactionSlot>),
}

/// Hands out entity repositories that share one execution context.
///
/// A factory is owned by one logical operation at a time; it is not meant to
/// be shared between concurrent callers.
pub struct RepositoryFactory {
    pool: ConnectionPool,
    context: ExecutionContext,
}

impl std::fmt::Debug for RepositoryFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryFactory")
            .field("transactional", &self.is_transactional())
            .finish_non_exhaustive()
    }
}

impl RepositoryFactory {
    /// A pool-bound factory.
    pub fn new(pool: ConnectionPool) -> Self {
        RepositoryFactory {
            pool,
            context: ExecutionContext::Pool,
        }
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.context, ExecutionContext::Transaction(_))
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Opens a transaction and returns a new factory bound to it.
    ///
    /// ## Errors
    /// * `DbError::TransactionState` - this factory is already
    ///   transaction-bound (no nested transactions)
    /// * `DbError::Timeout` / `DbError::Cancelled` - from the context
    pub async fn begin_transaction(&self, ctx: &CallContext) -> DbResult<RepositoryFactory> {
        if self.is_transactional() {
            return Err(DbError::TransactionState(
                "cannot begin: factory is already bound to a transaction".to_string(),
            ));
        }

        // Same acquisition bound as `ConnectionPool::acquire`.
        let tx = ctx
            .or_timeout(self.pool.config().connect_timeout)
            .run("begin_transaction", async {
                self.pool
                    .inner()
                    .begin()
                    .await
                    .map_err(|e| DbError::from_sqlx("transaction", "begin", e))
            })
            .await?;

        debug!("Transaction started");

        Ok(RepositoryFactory {
            pool: self.pool.clone(),
            context: ExecutionContext::Transaction(Mutex::new(Some(tx))),
        })
    }

    /// Commits the active transaction. The factory is finished afterwards,
    /// whether or not the commit succeeded.
    pub async fn commit(&self, ctx: &CallContext) -> DbResult<()> {
        let tx = self.take_active("commit").await?;

        ctx.run("commit", async move {
            tx.commit()
                .await
                .map_err(|e| DbError::from_sqlx("transaction", "commit", e))
        })
        .await?;

        info!("Transaction committed");
        Ok(())
    }

    /// Rolls back the active transaction. The factory is finished afterwards.
    pub async fn rollback(&self, ctx: &CallContext) -> DbResult<()> {
        let tx = self.take_active("rollback").await?;

        ctx.run("rollback", async move {
            tx.rollback()
                .await
                .map_err(|e| DbError::from_sqlx("transaction", "rollback", e))
        })
        .await?;

        info!("Transaction rolled back");
        Ok(())
    }

    async fn take_active(&self, operation: &str) -> DbResult<Transaction<'static, Postgres>> {
        match &self.context {
            ExecutionContext::Pool => Err(DbError::TransactionState(format!(
                "cannot {operation}: factory is not bound to a transaction"
            ))),
            ExecutionContext::Transaction(slot) => slot.lock().await.take().ok_or_else(|| {
                DbError::TransactionState(format!(
                    "cannot {operation}: transaction already finished"
                ))
            }),
        }
    }

    /// Checks out whatever this factory executes on for one repository call.
    pub(crate) async fn lease(&self, ctx: &CallContext) -> DbResult<Lease<'_>> {
        match &self.context {
            ExecutionContext::Pool => Ok(Lease::Pooled(self.pool.acquire(ctx).await?)),
            ExecutionContext::Transaction(slot) => {
                let guard = ctx.run("acquire", async { Ok(slot.lock().await) }).await?;
                if guard.is_none() {
                    return Err(finished());
                }
                Ok(Lease::Transaction(guard))
            }
        }
    }

    // =========================================================================
    // Repositories
    // =========================================================================

    pub fn employees(&self) -> EmployeeRepository<'_> {
        Repository::new(self)
    }

    pub fn positions(&self) -> PositionRepository<'_> {
        Repository::new(self)
    }

    pub fn departments(&self) -> DepartmentRepository<'_> {
        Repository::new(self)
    }

    pub fn sites(&self) -> SiteRepository<'_> {
        Repository::new(self)
    }
}

impl Drop for RepositoryFactory {
    fn drop(&mut self) {
        if let ExecutionContext::Transaction(slot) = &mut self.context {
            if slot.get_mut().is_some() {
                // sqlx rolls the transaction back when it is dropped.
                warn!("Transaction-bound factory dropped without commit or rollback; rolling back");
            }
        }
    }
}

fn finished() -> DbError {
    DbError::TransactionState("transaction already finished".to_string())
}

/// A connection held for the duration of one repository call.
///
/// Pooled connections go back to the pool when the lease drops; a
/// transaction lease only unlocks the factory's transaction.
pub(crate) enum Lease<'f> {
    Pooled(PooledConnection),
    Transaction(MutexGuard<'f, TransactionSlot>),
}

impl Lease<'_> {
    pub(crate) fn connection(&mut self) -> DbResult<&mut PgConnection> {
        match self {
            Lease::Pooled(conn) => Ok(&mut **conn),
            Lease::Transaction(guard) => guard.as_deref_mut().ok_or_else(finished),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn finished_factory() -> RepositoryFactory {
        RepositoryFactory {
            pool: ConnectionPool::lazy_for_tests(),
            context: ExecutionContext::Transaction(Mutex::new(None)),
        }
    }

    #[tokio::test]
    async fn test_commit_without_transaction_fails() {
        let factory = ConnectionPool::lazy_for_tests().factory();
        let ctx = CallContext::background();

        assert!(!factory.is_transactional());
        assert!(factory.commit(&ctx).await.unwrap_err().is_transaction_state());
        assert!(factory.rollback(&ctx).await.unwrap_err().is_transaction_state());
    }

    #[tokio::test]
    async fn test_nested_begin_is_rejected() {
        let factory = finished_factory();
        let err = factory
            .begin_transaction(&CallContext::background())
            .await
            .unwrap_err();

        assert!(err.is_transaction_state());
    }

    #[tokio::test]
    async fn test_finished_transaction_rejects_commit_and_rollback() {
        let factory = finished_factory();
        let ctx = CallContext::background();

        let err = factory.commit(&ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transaction state error: cannot commit: transaction already finished"
        );
        assert!(factory.rollback(&ctx).await.unwrap_err().is_transaction_state());
    }

    #[tokio::test]
    async fn test_finished_transaction_does_not_fall_back_to_pool() {
        let factory = finished_factory();
        let ctx = CallContext::background();

        let err = factory.employees().get_by_id(&ctx, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_transaction_state());

        let err = factory.sites().delete(&ctx, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_transaction_state());
    }
}
