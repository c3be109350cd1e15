//! # Transaction Coordinator
//!
//! Runs one callback inside one unit of work:
//!
//! ```text
//! begin() ──────────── deadline expired ──→ BankError::Timeout
//!    ↓
//! callback(&mut tx) ──── Ok ──────────→ commit()
//!    │
//!    ├── Err ─────────────────────────→ rollback(), error returned
//!    ├── panic ───────────────────────→ tx dropped, BankError::Internal
//!    └── deadline expired ────────────→ tx dropped, BankError::Timeout
//! ```
//!
//! One deadline covers `begin` and the callback together, so waiting for a
//! pooled connection counts against it. `commit` is not cut off.
//!
//! A panicking or timed-out callback may have left a statement in flight, so
//! the transaction is dropped instead of rolled back. Both stores discard an
//! unfinished transaction on drop (PostgreSQL by closing the connection).
//!
//! Nesting is not supported: one callback, one transaction.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{error, warn};

use super::store::{StoreTx, TxStore};
use crate::errors::BankError;

/// Runs callbacks with commit/rollback semantics against a [`TxStore`].
#[derive(Clone)]
pub struct TxCoordinator {
    store: Arc<dyn TxStore>,
    /// Default deadline for one callback.
    timeout: Duration,
}

impl TxCoordinator {
    pub fn new(store: Arc<dyn TxStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` in a new transaction with the default deadline.
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// let account = coordinator
    ///     .exec_tx(|tx| Box::pin(async move { tx.add_account_balance(1, 10).await }))
    ///     .await?;
    /// ```
    pub async fn exec_tx<T, F>(&self, f: F) -> Result<T, BankError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> BoxFuture<'t, Result<T, BankError>> + Send,
    {
        self.exec_tx_within(self.timeout, f).await
    }

    /// Run `f` in a new transaction, rolling back if opening the transaction
    /// and running `f` take longer than `timeout` together.
    pub async fn exec_tx_within<T, F>(&self, timeout: Duration, f: F) -> Result<T, BankError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> BoxFuture<'t, Result<T, BankError>> + Send,
    {
        let deadline = Instant::now() + timeout;

        let mut tx = match tokio::time::timeout_at(deadline, self.store.begin()).await {
            Ok(begun) => begun?,
            Err(_) => {
                warn!("Could not begin a transaction within {:?}", timeout);
                return Err(BankError::Timeout(timeout));
            }
        };

        let work = AssertUnwindSafe(f(tx.as_mut())).catch_unwind();
        let finished = tokio::time::timeout_at(deadline, work).await;
        let outcome = match finished {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                error!("Transaction callback panicked: {}", message);
                drop(tx);
                return Err(BankError::Internal(format!(
                    "transaction callback panicked: {}",
                    message
                )));
            }
            Err(_) => {
                warn!("Transaction exceeded its deadline of {:?}, aborting", timeout);
                drop(tx);
                return Err(BankError::Timeout(timeout));
            }
        };

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed after '{}': {}", err, rollback_err);
                }
                Err(err)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
