//! # Database Models
//!
//! This module defines the data structures that map to database tables,
//! plus the parameter and result types passed to the stores.
//!
//! ## Table Overview
//!
//! | Table | Description |
//! |-------|-------------|
//! | `accounts` | Owner, currency and current balance |
//! | `entries` | Append-only ledger, one row per account per transfer |
//! | `transfers` | Append-only record of every committed transfer |
//!
//! ## Relationship Diagram
//!
//! ```text
//! ┌─────────────┐       ┌──────────────────┐
//! │  accounts   │──────<│     entries      │
//! │             │       │                  │
//! │ id (PK)     │       │ account_id (FK)  │
//! │ balance     │       │ amount (signed)  │
//! │ currency    │       └──────────────────┘
//! │             │
//! │             │       ┌──────────────────┐
//! │             │──────<│    transfers     │
//! │             │       │ from_account_id  │
//! └─────────────┘       │ to_account_id    │
//!                       │ amount (> 0)     │
//!                       └──────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `accounts` table.
///
/// ## Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | id | i64 | Assigned by the store, increasing |
/// | owner | String | Account holder name |
/// | balance | i64 | Minor units (cents) |
/// | currency | String | Fixed at creation |
///
/// The balance only changes through a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// A row of the `entries` table.
///
/// Negative for the source leg of a transfer, positive for the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A row of the `transfers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountParams {
    pub owner: String,
    pub currency: String,
    /// Opening balance, zero for accounts created through the API.
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAccountsParams {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntriesParams {
    pub account_id: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Transfers where `account_id` is either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTransfersParams {
    pub account_id: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Input of the funds transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything written by one committed transfer.
///
/// `from_account` and `to_account` carry the balances as of the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}
