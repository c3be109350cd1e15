//! # Store Contracts
//!
//! Two separate seams:
//!
//! - [`Repository`]: single-statement reads and writes, no transactional
//!   contract beyond the atomicity of one statement. Used by the query
//!   facade and the HTTP layer.
//! - [`TxStore`] / [`StoreTx`]: an explicit unit of work. Everything done
//!   through a `StoreTx` becomes visible together on `commit`, or not at all.
//!
//! Both are implemented by [`PgStore`](super::PgStore) and
//! [`MemoryStore`](super::MemoryStore).

use async_trait::async_trait;

use super::models::*;
use crate::errors::BankError;

/// Read/write repository used outside of transfers.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, BankError>;

    /// Fails with `NotFound` if the account does not exist.
    async fn get_account(&self, id: i64) -> Result<Account, BankError>;

    /// Accounts ordered by id.
    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, BankError>;

    async fn get_transfer(&self, id: i64) -> Result<Transfer, BankError>;

    /// Transfers touching an account, ordered by id.
    async fn list_transfers(&self, params: ListTransfersParams)
        -> Result<Vec<Transfer>, BankError>;

    /// Ledger entries of an account, ordered by id.
    async fn list_entries(&self, params: ListEntriesParams) -> Result<Vec<Entry>, BankError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), BankError>;
}

/// Something that can open a unit of work.
#[async_trait]
pub trait TxStore: Send + Sync {
    /// Open a unit of work.
    ///
    /// Must be cancel-safe: the coordinator drops this future when its
    /// deadline expires, and nothing may leak when it does.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, BankError>;
}

/// An open unit of work.
///
/// Dropping a `StoreTx` without calling [`commit`](StoreTx::commit) must
/// discard everything it wrote and release its row locks.
#[async_trait]
pub trait StoreTx: Send {
    /// Read an account as seen by this transaction. Does not lock the row.
    async fn get_account(&mut self, id: i64) -> Result<Account, BankError>;

    async fn create_transfer(&mut self, params: &CreateTransferParams)
        -> Result<Transfer, BankError>;

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry, BankError>;

    /// Atomically add `amount` to the balance and return the updated row.
    ///
    /// Takes the row lock, held until commit or rollback.
    async fn add_account_balance(&mut self, id: i64, amount: i64) -> Result<Account, BankError>;

    async fn commit(self: Box<Self>) -> Result<(), BankError>;

    async fn rollback(self: Box<Self>) -> Result<(), BankError>;
}
