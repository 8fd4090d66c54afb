//! # Call Context
//!
//! Deadline and cancellation carried into every store operation.
//!
//! ## How It Is Applied
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller                                                                 │
//! │    │  CallContext::with_timeout(2s).cancellable(token)                 │
//! │    ▼                                                                    │
//! │  repository / pool / migration call                                    │
//! │    │                                                                    │
//! │    ├── acquire connection ─┐                                           │
//! │    └── run statement ──────┴─► ctx.run("op", future)                   │
//! │                                   │                                     │
//! │                                   ├── token cancelled → Cancelled      │
//! │                                   ├── deadline passed → Timeout        │
//! │                                   └── completed       → result         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation is cooperative: the guarded future is dropped, and any
//! connection it held goes back to the pool through its lease.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{DbError, DbResult};

/// Deadline plus optional cancellation token for one logical operation.
///
/// Cheap to clone; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    /// No deadline, not cancellable.
    pub fn background() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CallContext {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attaches a cancellation token.
    pub fn cancellable(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Same context, with `fallback` applied when no deadline is set.
    pub fn or_timeout(&self, fallback: Duration) -> Self {
        CallContext {
            deadline: self.deadline.or_else(|| Some(Instant::now() + fallback)),
            cancel: self.cancel.clone(),
        }
    }

    /// Runs `fut` under this context's deadline and cancellation token.
    ///
    /// A context that is already cancelled fails without polling `fut`.
    pub async fn run<F, T>(&self, operation: &'static str, fut: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        if self.is_cancelled() {
            return Err(DbError::Cancelled { operation });
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| DbError::Timeout { operation })?,
                None => fut.await,
            }
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(DbError::Cancelled { operation }),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
