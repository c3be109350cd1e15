//! # PostgreSQL Store
//!
//! [`PgStore`] implements both store contracts on top of the deadpool pool.
//!
//! ## Transactions
//!
//! A [`PgTx`] owns one pooled connection for its whole lifetime and drives
//! `BEGIN` / `COMMIT` / `ROLLBACK` on it explicitly:
//!
//! ```text
//! begin()            → pool.get(), BEGIN ISOLATION LEVEL ...
//! add_account_balance → UPDATE ... RETURNING  (row lock until the end)
//! commit()           → COMMIT, connection back to the pool
//! drop without end   → connection detached from the pool and closed,
//!                      the server aborts the transaction
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use deadpool_postgres::{Client, Object};
use tracing::{debug, warn};

use super::models::*;
use super::queries;
use super::store::{Repository, StoreTx, TxStore};
use super::Database;
use crate::errors::BankError;

/// Transaction isolation level used for every unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// PostgreSQL's default. Enough to prevent lost updates because balance
    /// changes are single `UPDATE ... SET balance = balance + $n` statements.
    #[default]
    ReadCommitted,
    RepeatableRead,
    /// May fail with `40001`, which surfaces as a retryable `Conflict`.
    Serializable,
}

impl IsolationLevel {
    fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "read_committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            other => Err(format!("unknown isolation level: {}", other)),
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
    isolation: IsolationLevel,
}

impl PgStore {
    pub fn new(db: Database, isolation: IsolationLevel) -> Self {
        Self { db, isolation }
    }

    async fn client(&self) -> Result<Client, BankError> {
        Ok(self.db.pool().get().await?)
    }
}

#[async_trait]
impl Repository for PgStore {
    async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, BankError> {
        let client = self.client().await?;
        queries::create_account(&client, params).await
    }

    async fn get_account(&self, id: i64) -> Result<Account, BankError> {
        let client = self.client().await?;
        queries::get_account(&client, id).await
    }

    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, BankError> {
        let client = self.client().await?;
        queries::list_accounts(&client, params).await
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, BankError> {
        let client = self.client().await?;
        queries::get_transfer(&client, id).await
    }

    async fn list_transfers(
        &self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, BankError> {
        let client = self.client().await?;
        queries::list_transfers(&client, params).await
    }

    async fn list_entries(&self, params: ListEntriesParams) -> Result<Vec<Entry>, BankError> {
        let client = self.client().await?;
        queries::list_entries(&client, params).await
    }

    async fn ping(&self) -> Result<(), BankError> {
        let client = self.client().await?;
        client.query("SELECT 1", &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl TxStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, BankError> {
        // Owned by a PgTx before BEGIN is sent: if this future is dropped
        // mid-statement, PgTx::drop closes the connection.
        let tx = PgTx {
            client: Some(self.client().await?),
        };
        tx.client()?
            .batch_execute(&format!("BEGIN ISOLATION LEVEL {}", self.isolation))
            .await?;
        debug!("Transaction started ({})", self.isolation);
        Ok(Box::new(tx))
    }
}

/// An open PostgreSQL transaction holding its pooled connection.
pub struct PgTx {
    /// `None` once committed or rolled back.
    client: Option<Client>,
}

impl PgTx {
    fn client(&self) -> Result<&Client, BankError> {
        self.client
            .as_ref()
            .ok_or_else(|| BankError::Internal("transaction already finished".to_string()))
    }

    fn finish(&mut self) -> Result<Client, BankError> {
        self.client
            .take()
            .ok_or_else(|| BankError::Internal("transaction already finished".to_string()))
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn get_account(&mut self, id: i64) -> Result<Account, BankError> {
        queries::get_account(self.client()?, id).await
    }

    async fn create_transfer(
        &mut self,
        params: &CreateTransferParams,
    ) -> Result<Transfer, BankError> {
        queries::create_transfer(self.client()?, params).await
    }

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry, BankError> {
        queries::create_entry(self.client()?, params).await
    }

    async fn add_account_balance(&mut self, id: i64, amount: i64) -> Result<Account, BankError> {
        queries::add_account_balance(self.client()?, id, amount).await
    }

    async fn commit(self: Box<Self>) -> Result<(), BankError> {
        let mut this = self;
        let client = this.finish()?;
        client.batch_execute("COMMIT").await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BankError> {
        let mut this = self;
        let client = this.finish()?;
        let result = client.batch_execute("ROLLBACK").await;
        if let Err(e) = result {
            // Transaction state unknown, keep the connection out of the pool.
            warn!("Rollback failed, closing its connection: {}", e);
            drop(Object::take(client));
            return Err(e.into());
        }
        debug!("Transaction rolled back");
        Ok(())
    }
}

impl Drop for PgTx {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            // Closing the connection makes the server abort the transaction.
            warn!("Transaction dropped while open, closing its connection");
            drop(Object::take(client));
        }
    }
}
