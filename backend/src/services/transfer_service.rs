//! # Transfer Service
//!
//! Request-level checks around the [`TransferEngine`], plus the retry
//! policy for transient failures.
//!
//! ## Request Flow
//!
//! ```text
//! CreateTransferRequest
//!        ↓
//! ids >= 1? currency supported? amount > 0?        → InvalidArgument
//! from != to?                                      → InvalidArgument
//!        ↓
//! load both accounts                               → NotFound
//!        ↓
//! both accounts hold the requested currency?       → InvalidArgument
//!        ↓
//! engine.transfer_tx ──── Conflict / Timeout ──→ backoff, try again
//!        │                                       (up to max_retries)
//!        ↓
//! TransferTxResult
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use super::TransferEngine;
use crate::db::{Account, Repository, TransferTxParams, TransferTxResult};
use crate::errors::{BankError, ErrorKind};
use crate::models::CreateTransferRequest;
use crate::utils::{is_supported_currency, validate_id};

/// Validates transfer requests and drives the engine.
#[derive(Clone)]
pub struct TransferService {
    repo: Arc<dyn Repository>,
    engine: TransferEngine,

    /// Extra attempts after a transient failure.
    max_retries: u32,

    /// Delay before the first retry, doubled for each one after.
    retry_backoff: Duration,
}

impl TransferService {
    pub fn new(
        repo: Arc<dyn Repository>,
        engine: TransferEngine,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            repo,
            engine,
            max_retries,
            retry_backoff,
        }
    }

    /// Validate a request and execute it.
    pub async fn create_transfer(
        &self,
        request: &CreateTransferRequest,
    ) -> Result<TransferTxResult, BankError> {
        validate_id("fromAccountId", request.from_account_id).map_err(BankError::InvalidArgument)?;
        validate_id("toAccountId", request.to_account_id).map_err(BankError::InvalidArgument)?;
        if !is_supported_currency(&request.currency) {
            return Err(BankError::InvalidArgument(format!(
                "unsupported currency: {}",
                request.currency
            )));
        }
        if request.amount <= 0 {
            return Err(BankError::InvalidArgument(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.from_account_id == request.to_account_id {
            return Err(BankError::InvalidArgument(
                "source and destination accounts must differ".to_string(),
            ));
        }

        self.valid_account(request.from_account_id, &request.currency).await?;
        self.valid_account(request.to_account_id, &request.currency).await?;

        self.transfer_with_retry(TransferTxParams {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount,
        })
        .await
    }

    /// Run the engine, retrying transient failures with exponential backoff.
    ///
    /// Permanent errors are returned on the first attempt.
    pub async fn transfer_with_retry(
        &self,
        params: TransferTxParams,
    ) -> Result<TransferTxResult, BankError> {
        let mut attempt = 0;
        let mut delay = self.retry_backoff;

        loop {
            match self.engine.transfer_tx(params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transfer {} -> {} failed ({}), retry {}/{} in {:?}",
                        params.from_account_id,
                        params.to_account_id,
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => {
                    if e.kind() == ErrorKind::Internal {
                        error!(
                            "Transfer {} -> {} failed: {}",
                            params.from_account_id, params.to_account_id, e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn valid_account(&self, id: i64, currency: &str) -> Result<Account, BankError> {
        let account = self.repo.get_account(id).await?;
        if account.currency != currency {
            return Err(BankError::InvalidArgument(format!(
                "account [{}] currency mismatch: {} vs {}",
                id, account.currency, currency
            )));
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::db::{CreateAccountParams, MemoryStore, StoreTx, TxCoordinator, TxStore};

    /// Fails `begin` with a conflict a fixed number of times.
    struct FlakyStore {
        inner: MemoryStore,
        conflicts_left: AtomicU32,
        begins: Arc<AtomicU32>,
    }

    #[async_trait]
    impl TxStore for FlakyStore {
        async fn begin(&self) -> Result<Box<dyn StoreTx>, BankError> {
            self.begins.fetch_add(1, Ordering::SeqCst);
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(BankError::Conflict("could not serialize access".to_string()));
            }
            self.inner.begin().await
        }
    }

    struct Fixture {
        store: MemoryStore,
        begins: Arc<AtomicU32>,
        service: TransferService,
    }

    fn fixture(conflicts: u32, max_retries: u32) -> Fixture {
        let store = MemoryStore::new();
        let begins = Arc::new(AtomicU32::new(0));
        let flaky = FlakyStore {
            inner: store.clone(),
            conflicts_left: AtomicU32::new(conflicts),
            begins: begins.clone(),
        };
        let engine = TransferEngine::new(
            TxCoordinator::new(Arc::new(flaky), Duration::from_secs(2)),
            false,
        );
        let service = TransferService::new(
            Arc::new(store.clone()),
            engine,
            max_retries,
            Duration::from_millis(1),
        );
        Fixture {
            store,
            begins,
            service,
        }
    }

    async fn open(store: &MemoryStore, currency: &str, balance: i64) -> Account {
        store
            .create_account(&CreateAccountParams {
                owner: "owner".to_string(),
                currency: currency.to_string(),
                balance,
            })
            .await
            .unwrap()
    }

    fn request(from: &Account, to: &Account, amount: i64, currency: &str) -> CreateTransferRequest {
        CreateTransferRequest {
            from_account_id: from.id,
            to_account_id: to.id,
            amount,
            currency: currency.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_transfer() {
        let fx = fixture(0, 3);
        let a = open(&fx.store, "USD", 100).await;
        let b = open(&fx.store, "USD", 50).await;

        let result = fx.service.create_transfer(&request(&a, &b, 30, "USD")).await.unwrap();

        assert_eq!(result.from_account.balance, 70);
        assert_eq!(result.to_account.balance, 80);
        assert_eq!(fx.begins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_currency_mismatch_is_rejected() {
        let fx = fixture(0, 3);
        let a = open(&fx.store, "USD", 100).await;
        let b = open(&fx.store, "EUR", 50).await;

        let err = fx.service.create_transfer(&request(&a, &b, 30, "USD")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidArgument(ref m) if m.contains("currency mismatch")));

        let err = fx.service.create_transfer(&request(&a, &b, 30, "GBP")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidArgument(_)));

        assert_eq!(fx.begins.load(Ordering::SeqCst), 0);
        assert_eq!(fx.store.get_account(a.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_request_checks_run_before_lookups() {
        let fx = fixture(0, 3);
        let a = open(&fx.store, "USD", 100).await;

        let err = fx.service.create_transfer(&request(&a, &a, 30, "USD")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidArgument(_)));

        let missing = Account { id: 404, ..a.clone() };
        let err = fx.service.create_transfer(&request(&a, &missing, 0, "USD")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidArgument(_)));

        let err = fx.service.create_transfer(&request(&a, &missing, 5, "USD")).await.unwrap_err();
        assert!(matches!(err, BankError::NotFound { id: 404, .. }));

        let zero = Account { id: 0, ..a.clone() };
        let err = fx.service.create_transfer(&request(&zero, &a, 5, "USD")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidArgument(ref m) if m.contains("fromAccountId")));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let fx = fixture(2, 3);
        let a = open(&fx.store, "CAD", 100).await;
        let b = open(&fx.store, "CAD", 0).await;

        let result = fx.service.create_transfer(&request(&a, &b, 10, "CAD")).await.unwrap();

        assert_eq!(result.to_account.balance, 10);
        assert_eq!(fx.begins.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let fx = fixture(5, 2);
        let a = open(&fx.store, "USD", 100).await;
        let b = open(&fx.store, "USD", 0).await;

        let err = fx.service.create_transfer(&request(&a, &b, 10, "USD")).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(fx.begins.load(Ordering::SeqCst), 3);
        assert_eq!(fx.store.get_account(a.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let fx = fixture(0, 3);
        let a = open(&fx.store, "USD", 100).await;

        let err = fx
            .service
            .transfer_with_retry(TransferTxParams {
                from_account_id: a.id,
                to_account_id: 999,
                amount: 10,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BankError::NotFound { .. }));
        assert_eq!(fx.begins.load(Ordering::SeqCst), 1);
    }
}
