//! # Funds Transfer Engine
//!
//! Moves money between two accounts as one unit of work.
//!
//! ## Transfer Flow
//!
//! ```text
//! 1. Reject amount <= 0 and from == to          (no transaction opened)
//!                ↓
//! 2. Begin transaction
//!                ↓
//! 3. Both accounts must exist                   (NotFound otherwise)
//!                ↓
//! 4. INSERT transfer(from, to, amount)
//! 5. INSERT entry(from, -amount)
//! 6. INSERT entry(to, +amount)
//!                ↓
//! 7. UPDATE balance = balance + n RETURNING     (smaller account id first)
//!                ↓
//! 8. Commit, or roll back on any failure
//! ```
//!
//! ## Lock Ordering
//!
//! Step 7 takes a row lock on each account. A→B and B→A running at the same
//! time would lock the two rows in opposite orders and deadlock, so the
//! account with the smaller id is always updated first, whichever side of
//! the transfer it is on.
//!
//! ## Retries
//!
//! The engine never retries. Callers check [`BankError::is_transient`] and
//! resubmit the same parameters (see `TransferService`).

use std::time::Duration;

use tracing::info;

use crate::db::{
    Account, CreateEntryParams, CreateTransferParams, StoreTx, TransferTxParams, TransferTxResult,
    TxCoordinator,
};
use crate::errors::BankError;

/// The funds transfer engine.
///
/// ## Usage
///
/// ```rust,ignore
/// let engine = TransferEngine::new(coordinator, false);
/// let result = engine
///     .transfer_tx(TransferTxParams { from_account_id: 1, to_account_id: 2, amount: 30 })
///     .await?;
/// assert_eq!(result.from_entry.amount + result.to_entry.amount, 0);
/// ```
#[derive(Clone)]
pub struct TransferEngine {
    coordinator: TxCoordinator,

    /// Fail with `InsufficientFunds` instead of letting the source go negative.
    reject_overdraft: bool,
}

impl TransferEngine {
    pub fn new(coordinator: TxCoordinator, reject_overdraft: bool) -> Self {
        Self {
            coordinator,
            reject_overdraft,
        }
    }

    /// Run a transfer with the coordinator's default deadline.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult, BankError> {
        self.transfer_tx_within(params, self.coordinator.timeout()).await
    }

    /// Run a transfer whose `begin` and body must finish within `timeout`.
    ///
    /// Waiting for a connection counts against the deadline. The final
    /// `COMMIT` is not interrupted once started.
    ///
    /// ## Returns
    ///
    /// * `Ok(TransferTxResult)` - Transfer, both entries and both accounts as committed
    /// * `Err(BankError::InvalidArgument)` - Non-positive amount, same account, or balance overflow
    /// * `Err(BankError::NotFound)` - Either account is missing
    /// * `Err(BankError::InsufficientFunds)` - Overdraft while `reject_overdraft` is set
    /// * `Err(BankError::Conflict | Timeout)` - Transient, safe to retry
    pub async fn transfer_tx_within(
        &self,
        params: TransferTxParams,
        timeout: Duration,
    ) -> Result<TransferTxResult, BankError> {
        validate_params(&params)?;

        let reject_overdraft = self.reject_overdraft;
        let result = self
            .coordinator
            .exec_tx_within(timeout, move |tx| {
                Box::pin(execute_transfer(tx, params, reject_overdraft))
            })
            .await?;

        info!(
            "Transfer {} committed: {} from account {} to account {}",
            result.transfer.id, params.amount, params.from_account_id, params.to_account_id
        );
        Ok(result)
    }
}

fn validate_params(params: &TransferTxParams) -> Result<(), BankError> {
    if params.amount <= 0 {
        return Err(BankError::InvalidArgument(format!(
            "amount must be positive, got {}",
            params.amount
        )));
    }
    if params.from_account_id == params.to_account_id {
        return Err(BankError::InvalidArgument(format!(
            "cannot transfer from account {} to itself",
            params.from_account_id
        )));
    }
    Ok(())
}

async fn execute_transfer(
    tx: &mut dyn StoreTx,
    params: TransferTxParams,
    reject_overdraft: bool,
) -> Result<TransferTxResult, BankError> {
    let TransferTxParams {
        from_account_id,
        to_account_id,
        amount,
    } = params;

    tx.get_account(from_account_id).await?;
    tx.get_account(to_account_id).await?;

    let transfer = tx
        .create_transfer(&CreateTransferParams {
            from_account_id,
            to_account_id,
            amount,
        })
        .await?;

    let from_entry = tx
        .create_entry(&CreateEntryParams {
            account_id: from_account_id,
            amount: -amount,
        })
        .await?;

    let to_entry = tx
        .create_entry(&CreateEntryParams {
            account_id: to_account_id,
            amount,
        })
        .await?;

    let (from_account, to_account) = if from_account_id < to_account_id {
        add_money(tx, from_account_id, -amount, to_account_id, amount).await?
    } else {
        let (to_account, from_account) =
            add_money(tx, to_account_id, amount, from_account_id, -amount).await?;
        (from_account, to_account)
    };

    if reject_overdraft && from_account.balance < 0 {
        return Err(BankError::InsufficientFunds {
            account_id: from_account.id,
            balance: from_account.balance,
        });
    }

    Ok(TransferTxResult {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}

/// Apply two balance changes in the order given. The caller passes the
/// smaller account id first.
async fn add_money(
    tx: &mut dyn StoreTx,
    first_id: i64,
    first_amount: i64,
    second_id: i64,
    second_amount: i64,
) -> Result<(Account, Account), BankError> {
    let first = tx.add_account_balance(first_id, first_amount).await?;
    let second = tx.add_account_balance(second_id, second_amount).await?;
    Ok((first, second))
}
