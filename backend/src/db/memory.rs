//! # In-Memory Store
//!
//! A process-local implementation of both store contracts, used by the test
//! suite and by `DATABASE_URL=memory://` for local runs without PostgreSQL.
//!
//! It behaves like the database where it matters for transfers:
//!
//! - `add_account_balance` takes a per-account row lock, held until the
//!   transaction commits or is dropped. Two transactions locking the same
//!   rows in opposite order deadlock here exactly as they would in
//!   PostgreSQL.
//! - Writes are buffered in the transaction and applied to the shared
//!   tables in one step on commit. Dropping the transaction discards them.
//! - Reads outside a transaction see committed data only.
//! - Ids come from sequences that are not rolled back, so aborted
//!   transactions leave gaps.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::models::*;
use super::store::{Repository, StoreTx, TxStore};
use crate::errors::BankError;

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
}

struct Inner {
    tables: RwLock<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
}

impl Inner {
    async fn row_lock(&self, id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    async fn committed_account(&self, id: i64) -> Result<Account, BankError> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| BankError::account_not_found(id))
    }
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst)
}

fn page<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// In-process store. Cloning shares the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                account_seq: AtomicI64::new(1),
                entry_seq: AtomicI64::new(1),
                transfer_seq: AtomicI64::new(1),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, BankError> {
        let account = Account {
            id: next_id(&self.inner.account_seq),
            owner: params.owner.clone(),
            balance: params.balance,
            currency: params.currency.clone(),
            created_at: Utc::now(),
        };

        let mut tables = self.inner.tables.write().await;
        tables.accounts.insert(account.id, account.clone());
        debug!("Created account {} for {}", account.id, account.owner);
        Ok(account)
    }

    async fn get_account(&self, id: i64) -> Result<Account, BankError> {
        self.inner.committed_account(id).await
    }

    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, BankError> {
        let tables = self.inner.tables.read().await;
        Ok(page(tables.accounts.values().cloned(), params.limit, params.offset))
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, BankError> {
        let tables = self.inner.tables.read().await;
        tables
            .transfers
            .get(&id)
            .cloned()
            .ok_or(BankError::NotFound { entity: "transfer", id })
    }

    async fn list_transfers(
        &self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, BankError> {
        let tables = self.inner.tables.read().await;
        let matching = tables.transfers.values().filter(|t| {
            t.from_account_id == params.account_id || t.to_account_id == params.account_id
        });
        Ok(page(matching.cloned(), params.limit, params.offset))
    }

    async fn list_entries(&self, params: ListEntriesParams) -> Result<Vec<Entry>, BankError> {
        let tables = self.inner.tables.read().await;
        let matching = tables
            .entries
            .values()
            .filter(|e| e.account_id == params.account_id);
        Ok(page(matching.cloned(), params.limit, params.offset))
    }

    async fn ping(&self) -> Result<(), BankError> {
        Ok(())
    }
}

#[async_trait]
impl TxStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, BankError> {
        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            row_guards: HashMap::new(),
            balance_deltas: HashMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        }))
    }
}

/// Open in-memory transaction.
pub struct MemoryTx {
    inner: Arc<Inner>,
    /// Row locks taken so far, released when the transaction ends.
    row_guards: HashMap<i64, OwnedMutexGuard<()>>,
    balance_deltas: HashMap<i64, i64>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl MemoryTx {
    async fn lock_row(&mut self, id: i64) {
        if self.row_guards.contains_key(&id) {
            return;
        }
        let lock = self.inner.row_lock(id).await;
        let guard = lock.lock_owned().await;
        self.row_guards.insert(id, guard);
    }

    async fn visible_account(&self, id: i64) -> Result<Account, BankError> {
        let mut account = self.inner.committed_account(id).await?;
        if let Some(delta) = self.balance_deltas.get(&id) {
            account.balance += delta;
        }
        Ok(account)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn get_account(&mut self, id: i64) -> Result<Account, BankError> {
        self.visible_account(id).await
    }

    async fn create_transfer(
        &mut self,
        params: &CreateTransferParams,
    ) -> Result<Transfer, BankError> {
        self.inner.committed_account(params.from_account_id).await?;
        self.inner.committed_account(params.to_account_id).await?;
        if params.amount <= 0 {
            return Err(BankError::Internal(
                "transfers_amount_check constraint violated".to_string(),
            ));
        }

        let transfer = Transfer {
            id: next_id(&self.inner.transfer_seq),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry, BankError> {
        self.inner.committed_account(params.account_id).await?;

        let entry = Entry {
            id: next_id(&self.inner.entry_seq),
            account_id: params.account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(&mut self, id: i64, amount: i64) -> Result<Account, BankError> {
        // Fail before locking so unknown ids never block.
        self.inner.committed_account(id).await?;
        self.lock_row(id).await;

        let mut account = self.visible_account(id).await?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| {
                BankError::InvalidArgument(format!("balance overflow on account {}", id))
            })?;
        *self.balance_deltas.entry(id).or_insert(0) += amount;
        Ok(account)
    }

    async fn commit(self: Box<Self>) -> Result<(), BankError> {
        let mut this = self;
        let inner = this.inner.clone();
        let mut tables = inner.tables.write().await;

        for (id, delta) in this.balance_deltas.drain() {
            let account = tables
                .accounts
                .get_mut(&id)
                .ok_or_else(|| BankError::account_not_found(id))?;
            account.balance += delta;
        }
        for entry in this.entries.drain(..) {
            tables.entries.insert(entry.id, entry);
        }
        for transfer in this.transfers.drain(..) {
            tables.transfers.insert(transfer.id, transfer);
        }

        // Row guards are released when `this` drops, after the tables lock.
        drop(tables);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BankError> {
        debug!(
            "Discarding {} entries and {} transfers",
            self.entries.len(),
            self.transfers.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn seed(store: &MemoryStore, owner: &str, balance: i64) -> Account {
        store
            .create_account(&CreateAccountParams {
                owner: owner.to_string(),
                currency: "USD".to_string(),
                balance,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let store = MemoryStore::new();
        let created = seed(&store, "alice", 100).await;

        let fetched = store.get_account(created.id).await.unwrap();
        assert_eq!(created, fetched);

        let missing = store.get_account(created.id + 1).await;
        assert!(matches!(missing, Err(BankError::NotFound { entity: "account", .. })));
    }

    #[tokio::test]
    async fn test_list_accounts_is_ordered_and_paged() {
        let store = MemoryStore::new();
        for i in 0..7 {
            seed(&store, &format!("owner-{}", i), 0).await;
        }

        let first = store
            .list_accounts(ListAccountsParams { limit: 5, offset: 0 })
            .await
            .unwrap();
        let second = store
            .list_accounts(ListAccountsParams { limit: 5, offset: 5 })
            .await
            .unwrap();

        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 2);
        let ids: Vec<i64> = first.iter().chain(second.iter()).map(|a| a.id).collect();
        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let a = seed(&store, "alice", 100).await;

        let mut tx = store.begin().await.unwrap();
        tx.create_entry(&CreateEntryParams { account_id: a.id, amount: -10 })
            .await
            .unwrap();
        let updated = tx.add_account_balance(a.id, -10).await.unwrap();
        assert_eq!(updated.balance, 90);

        // Not visible outside the transaction yet.
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 100);

        tx.commit().await.unwrap();
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 90);
        let entries = store
            .list_entries(ListEntriesParams { account_id: a.id, limit: 10, offset: 0 })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, -10);
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let a = seed(&store, "alice", 100).await;
        let b = seed(&store, "bob", 0).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_transfer(&CreateTransferParams {
                from_account_id: a.id,
                to_account_id: b.id,
                amount: 5,
            })
            .await
            .unwrap();
            tx.add_account_balance(a.id, -5).await.unwrap();
        }

        assert_eq!(store.get_account(a.id).await.unwrap().balance, 100);
        let transfers = store
            .list_transfers(ListTransfersParams { account_id: a.id, limit: 10, offset: 0 })
            .await
            .unwrap();
        assert!(transfers.is_empty());

        // The row lock was released with the transaction.
        let mut tx = store.begin().await.unwrap();
        let locked = tokio::time::timeout(
            Duration::from_millis(200),
            tx.add_account_balance(a.id, 1),
        )
        .await;
        assert!(locked.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_row_lock_blocks_until_commit() {
        let store = MemoryStore::new();
        let a = seed(&store, "alice", 100).await;

        let mut first = store.begin().await.unwrap();
        first.add_account_balance(a.id, -30).await.unwrap();

        let contender = store.clone();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await?;
            let account = second.add_account_balance(a.id, -30).await?;
            second.commit().await?;
            Ok::<_, BankError>(account)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        first.commit().await.unwrap();
        let account = handle.await.unwrap().unwrap();
        assert_eq!(account.balance, 40);
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 40);
    }

    #[tokio::test]
    async fn test_entry_for_unknown_account_is_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let result = tx
            .create_entry(&CreateEntryParams { account_id: 99, amount: 1 })
            .await;
        assert!(matches!(result, Err(BankError::NotFound { id: 99, .. })));

        let result = tx.add_account_balance(99, 1).await;
        assert!(matches!(result, Err(BankError::NotFound { id: 99, .. })));
    }

    #[tokio::test]
    async fn test_balance_overflow_is_invalid_argument() {
        let store = MemoryStore::new();
        let account = seed(&store, "alice", i64::MAX - 5).await;
        let mut tx = store.begin().await.unwrap();

        let result = tx.add_account_balance(account.id, 10).await;
        assert!(matches!(result, Err(BankError::InvalidArgument(_))));
        drop(tx);

        assert_eq!(store.get_account(account.id).await.unwrap().balance, i64::MAX - 5);
    }
}
