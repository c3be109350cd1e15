//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Account, Entry, Transfer, TransferTxResult};
use crate::utils::format_amount;

/// Standard API response wrapper.
///
/// All API responses follow this format:
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... },
///     "error": null
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "data": null,
///     "error": {
///         "code": "ACCOUNT_NOT_FOUND",
///         "message": "account not found: 42"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (null on error).
    pub data: Option<T>,

    /// Error information (null on success).
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// API error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code (e.g., "INSUFFICIENT_FUNDS").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// Account response.
///
/// Returned by `POST /accounts`, `GET /accounts/:id` and in listings.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "id": 1,
///         "owner": "alice",
///         "balance": 7000,
///         "currency": "USD",
///         "formattedBalance": "70.00 USD",
///         "createdAt": "2024-01-15T12:00:00Z"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i64,
    pub owner: String,

    /// Balance in minor units.
    pub balance: i64,

    pub currency: String,

    /// Human-readable balance.
    pub formatted_balance: String,

    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            formatted_balance: format_amount(account.balance, &account.currency),
            id: account.id,
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at,
        }
    }
}

/// Ledger entry response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: i64,
    pub account_id: i64,

    /// Signed amount: negative for money leaving the account.
    pub amount: i64,

    pub created_at: DateTime<Utc>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            created_at: entry.created_at,
        }
    }
}

/// Transfer record response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            from_account_id: transfer.from_account_id,
            to_account_id: transfer.to_account_id,
            amount: transfer.amount,
            created_at: transfer.created_at,
        }
    }
}

/// Completed transfer response.
///
/// Returned by `POST /transfers` with status 201.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "transfer": { "id": 9, "fromAccountId": 1, "toAccountId": 2, "amount": 3000, ... },
///         "fromEntry": { "id": 17, "accountId": 1, "amount": -3000, ... },
///         "toEntry": { "id": 18, "accountId": 2, "amount": 3000, ... },
///         "fromAccount": { "id": 1, "balance": 7000, ... },
///         "toAccount": { "id": 2, "balance": 8000, ... }
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResultResponse {
    pub transfer: TransferResponse,
    pub from_entry: EntryResponse,
    pub to_entry: EntryResponse,
    pub from_account: AccountResponse,
    pub to_account: AccountResponse,
}

impl From<TransferTxResult> for TransferResultResponse {
    fn from(result: TransferTxResult) -> Self {
        Self {
            transfer: result.transfer.into(),
            from_entry: result.from_entry.into(),
            to_entry: result.to_entry.into(),
            from_account: result.from_account.into(),
            to_account: result.to_account.into(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page.
    pub items: Vec<T>,

    /// Requested page, starting at 1.
    pub page_id: i64,

    /// Requested page size.
    pub page_size: i64,
}

impl<T> PageResponse<T> {
    /// Convert store rows into response items.
    pub fn from_rows<R: Into<T>>(rows: Vec<R>, page_id: i64, page_size: i64) -> Self {
        Self {
            items: rows.into_iter().map(Into::into).collect(),
            page_id,
            page_size,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status: "healthy" or "unhealthy".
    pub status: String,

    /// Store reachable.
    pub database: bool,

    /// `postgres` or `memory`.
    pub store: String,

    /// Service version.
    pub version: String,

    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}
