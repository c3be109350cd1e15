//! # Account Service
//!
//! Read-mostly facade over the [`Repository`]: opening accounts, paging
//! through them and reading the ledger. Nothing here opens a transaction.

use std::sync::Arc;

use tracing::info;

use crate::db::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams,
    ListTransfersParams, Repository, Transfer,
};
use crate::errors::BankError;
use crate::utils::{is_supported_currency, page_bounds, validate_id};

/// Account and ledger queries.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn Repository>,
    max_page_size: i64,
}

impl AccountService {
    pub fn new(repo: Arc<dyn Repository>, max_page_size: i64) -> Self {
        Self {
            repo,
            max_page_size,
        }
    }

    /// Open an account with a zero balance.
    pub async fn create_account(&self, owner: &str, currency: &str) -> Result<Account, BankError> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(BankError::InvalidArgument("owner must not be empty".to_string()));
        }
        if !is_supported_currency(currency) {
            return Err(BankError::InvalidArgument(format!(
                "unsupported currency: {}",
                currency
            )));
        }

        let account = self
            .repo
            .create_account(&CreateAccountParams {
                owner: owner.to_string(),
                currency: currency.to_string(),
                balance: 0,
            })
            .await?;

        info!("Opened account {} for {} in {}", account.id, account.owner, account.currency);
        Ok(account)
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, BankError> {
        check_id("id", id)?;
        self.repo.get_account(id).await
    }

    /// One page of accounts ordered by id. `page_id` starts at 1.
    pub async fn list_accounts(&self, page_id: i64, page_size: i64) -> Result<Vec<Account>, BankError> {
        let (limit, offset) = self.page(page_id, page_size)?;
        self.repo.list_accounts(ListAccountsParams { limit, offset }).await
    }

    /// One page of an account's ledger entries, oldest first.
    pub async fn list_entries(
        &self,
        account_id: i64,
        page_id: i64,
        page_size: i64,
    ) -> Result<Vec<Entry>, BankError> {
        check_id("id", account_id)?;
        let (limit, offset) = self.page(page_id, page_size)?;
        self.repo.get_account(account_id).await?;
        self.repo
            .list_entries(ListEntriesParams {
                account_id,
                limit,
                offset,
            })
            .await
    }

    /// One page of transfers where the account is either side.
    pub async fn list_transfers(
        &self,
        account_id: i64,
        page_id: i64,
        page_size: i64,
    ) -> Result<Vec<Transfer>, BankError> {
        check_id("id", account_id)?;
        let (limit, offset) = self.page(page_id, page_size)?;
        self.repo.get_account(account_id).await?;
        self.repo
            .list_transfers(ListTransfersParams {
                account_id,
                limit,
                offset,
            })
            .await
    }

    pub async fn get_transfer(&self, id: i64) -> Result<Transfer, BankError> {
        check_id("id", id)?;
        self.repo.get_transfer(id).await
    }

    pub async fn ping(&self) -> Result<(), BankError> {
        self.repo.ping().await
    }

    fn page(&self, page_id: i64, page_size: i64) -> Result<(i64, i64), BankError> {
        page_bounds(page_id, page_size, self.max_page_size).map_err(BankError::InvalidArgument)
    }
}

fn check_id(field: &str, id: i64) -> Result<(), BankError> {
    validate_id(field, id).map_err(BankError::InvalidArgument)
}
