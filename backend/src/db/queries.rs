//! # Database Queries
//!
//! This module contains all the SQL for the PostgreSQL store.
//! Each function runs exactly one statement on the client it is given, so the
//! same query works on a pooled connection and inside an open transaction.
//!
//! ## Query Organization
//!
//! Queries are grouped by the table they operate on:
//! - `*_account*` - Accounts table operations
//! - `*_entr*` - Entries table operations
//! - `*_transfer*` - Transfers table operations
//!
//! ## Error Handling
//!
//! All queries return `Result<T, BankError>`. Missing rows become
//! `BankError::NotFound`, driver errors are classified by
//! `From<tokio_postgres::Error>`.

use deadpool_postgres::Client;
use tokio_postgres::Row;
use tracing::debug;

use super::models::*;
use crate::errors::BankError;

// ============================================
// HELPER FUNCTIONS
// ============================================

fn row_to_account(row: &Row) -> Account {
    Account {
        id: row.get("id"),
        owner: row.get("owner"),
        balance: row.get("balance"),
        currency: row.get("currency"),
        created_at: row.get("created_at"),
    }
}

fn row_to_entry(row: &Row) -> Entry {
    Entry {
        id: row.get("id"),
        account_id: row.get("account_id"),
        amount: row.get("amount"),
        created_at: row.get("created_at"),
    }
}

fn row_to_transfer(row: &Row) -> Transfer {
    Transfer {
        id: row.get("id"),
        from_account_id: row.get("from_account_id"),
        to_account_id: row.get("to_account_id"),
        amount: row.get("amount"),
        created_at: row.get("created_at"),
    }
}

// ============================================
// ACCOUNT QUERIES
// ============================================

pub async fn create_account(
    client: &Client,
    params: &CreateAccountParams,
) -> Result<Account, BankError> {
    debug!("Creating account for owner: {}", params.owner);

    let row = client.query_one(
        r#"
        INSERT INTO accounts (owner, balance, currency)
        VALUES ($1, $2, $3)
        RETURNING id, owner, balance, currency, created_at
        "#,
        &[&params.owner, &params.balance, &params.currency],
    ).await?;

    Ok(row_to_account(&row))
}

pub async fn get_account(client: &Client, id: i64) -> Result<Account, BankError> {
    debug!("Fetching account: {}", id);

    let row = client.query_opt(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        WHERE id = $1
        LIMIT 1
        "#,
        &[&id],
    ).await?;

    row.map(|r| row_to_account(&r))
        .ok_or_else(|| BankError::account_not_found(id))
}

pub async fn list_accounts(
    client: &Client,
    params: ListAccountsParams,
) -> Result<Vec<Account>, BankError> {
    debug!("Listing accounts (limit: {}, offset: {})", params.limit, params.offset);

    let rows = client.query(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        ORDER BY id
        LIMIT $1 OFFSET $2
        "#,
        &[&params.limit, &params.offset],
    ).await?;

    Ok(rows.iter().map(row_to_account).collect())
}

/// Add `amount` to an account balance and return the updated row.
///
/// A single `UPDATE ... RETURNING` so the read and the write happen under
/// the same row lock. Inside a transaction that lock is held until commit.
pub async fn add_account_balance(
    client: &Client,
    id: i64,
    amount: i64,
) -> Result<Account, BankError> {
    debug!("Adding {} to balance of account {}", amount, id);

    let row = client.query_opt(
        r#"
        UPDATE accounts
        SET balance = balance + $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
        &[&id, &amount],
    ).await?;

    row.map(|r| row_to_account(&r))
        .ok_or_else(|| BankError::account_not_found(id))
}

// ============================================
// ENTRY QUERIES
// ============================================

pub async fn create_entry(
    client: &Client,
    params: &CreateEntryParams,
) -> Result<Entry, BankError> {
    let row = client.query_one(
        r#"
        INSERT INTO entries (account_id, amount)
        VALUES ($1, $2)
        RETURNING id, account_id, amount, created_at
        "#,
        &[&params.account_id, &params.amount],
    ).await?;

    Ok(row_to_entry(&row))
}

pub async fn list_entries(
    client: &Client,
    params: ListEntriesParams,
) -> Result<Vec<Entry>, BankError> {
    debug!("Listing entries for account: {}", params.account_id);

    let rows = client.query(
        r#"
        SELECT id, account_id, amount, created_at
        FROM entries
        WHERE account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
        &[&params.account_id, &params.limit, &params.offset],
    ).await?;

    Ok(rows.iter().map(row_to_entry).collect())
}

// ============================================
// TRANSFER QUERIES
// ============================================

pub async fn create_transfer(
    client: &Client,
    params: &CreateTransferParams,
) -> Result<Transfer, BankError> {
    let row = client.query_one(
        r#"
        INSERT INTO transfers (from_account_id, to_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, from_account_id, to_account_id, amount, created_at
        "#,
        &[&params.from_account_id, &params.to_account_id, &params.amount],
    ).await?;

    Ok(row_to_transfer(&row))
}

pub async fn get_transfer(client: &Client, id: i64) -> Result<Transfer, BankError> {
    let row = client.query_opt(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at
        FROM transfers
        WHERE id = $1
        LIMIT 1
        "#,
        &[&id],
    ).await?;

    row.map(|r| row_to_transfer(&r))
        .ok_or(BankError::NotFound { entity: "transfer", id })
}

pub async fn list_transfers(
    client: &Client,
    params: ListTransfersParams,
) -> Result<Vec<Transfer>, BankError> {
    debug!("Listing transfers for account: {}", params.account_id);

    let rows = client.query(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at
        FROM transfers
        WHERE from_account_id = $1 OR to_account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
        &[&params.account_id, &params.limit, &params.offset],
    ).await?;

    Ok(rows.iter().map(row_to_transfer).collect())
}
