//! # API Request Handlers
//!
//! This module contains the handler functions for each API endpoint.
//! Each handler:
//! 1. Extracts request data
//! 2. Calls the appropriate service
//! 3. Returns a formatted response
//!
//! ## Error Handling
//!
//! All errors are caught and returned as JSON:
//!
//! ```json
//! {
//!     "success": false,
//!     "error": {
//!         "code": "INSUFFICIENT_FUNDS",
//!         "message": "Insufficient funds in account 1: balance would be -20"
//!     }
//! }
//! ```
//!
//! | Error kind | Status |
//! |------------|--------|
//! | `InvalidArgument` | 400 |
//! | `NotFound` | 404 |
//! | `Transient` | 409 |
//! | `Internal` | 500 |

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::{BankError, ErrorKind};
use crate::models::{
    AccountResponse, ApiResponse, CreateAccountRequest, CreateTransferRequest, EntryResponse,
    HealthResponse, PageQuery, PageResponse, TransferResponse, TransferResultResponse,
};
use crate::AppState;

/// API information endpoint (root).
///
/// Returns information about available API endpoints.
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info() -> HttpResponse {
    let info = json!({
        "name": "Simple Bank API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Accounts, ledger entries and atomic money transfers",
        "endpoints": {
            "health": {
                "method": "GET",
                "path": "/health",
                "description": "Health check endpoint"
            },
            "accounts": {
                "create": {
                    "method": "POST",
                    "path": "/accounts",
                    "description": "Open an account with a zero balance"
                },
                "get": {
                    "method": "GET",
                    "path": "/accounts/{id}",
                    "description": "Get one account"
                },
                "list": {
                    "method": "GET",
                    "path": "/accounts?pageId=&pageSize=",
                    "description": "List accounts by id"
                },
                "entries": {
                    "method": "GET",
                    "path": "/accounts/{id}/entries?pageId=&pageSize=",
                    "description": "Ledger entries of an account"
                },
                "transfers": {
                    "method": "GET",
                    "path": "/accounts/{id}/transfers?pageId=&pageSize=",
                    "description": "Transfers touching an account"
                }
            },
            "transfers": {
                "create": {
                    "method": "POST",
                    "path": "/transfers",
                    "description": "Move money between two accounts"
                },
                "get": {
                    "method": "GET",
                    "path": "/transfers/{id}",
                    "description": "Get one transfer"
                }
            }
        }
    });

    HttpResponse::Ok()
        .content_type("application/json")
        .json(ApiResponse::success(info))
}

/// Health check endpoint.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": "healthy",
///         "database": true,
///         "store": "postgres",
///         "version": "0.1.0",
///         "timestamp": "2025-12-08T12:00:00Z"
///     }
/// }
/// ```
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let db_healthy = match state.accounts.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check failed: {}", e);
            false
        }
    };

    let response = HealthResponse {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database: db_healthy,
        store: if state.config.uses_memory_store() { "memory" } else { "postgres" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status_code).json(ApiResponse::success(response))
}

/// Open a new account.
///
/// ## Endpoint
///
/// `POST /accounts`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/accounts \
///   -H "Content-Type: application/json" \
///   -d '{"owner": "alice", "currency": "USD"}'
/// ```
pub async fn create_account(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateAccountRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    info!("Create account request: owner={}, currency={}", request.owner, request.currency);

    match state.accounts.create_account(&request.owner, &request.currency).await {
        Ok(account) => {
            HttpResponse::Created().json(ApiResponse::success(AccountResponse::from(account)))
        }
        Err(e) => error_response("Create account", &e),
    }
}

/// Get one account.
///
/// ## Endpoint
///
/// `GET /accounts/{id}`
pub async fn get_account(state: web::Data<Arc<AppState>>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    match state.accounts.get_account(id).await {
        Ok(account) => HttpResponse::Ok().json(ApiResponse::success(AccountResponse::from(account))),
        Err(e) => error_response("Get account", &e),
    }
}

/// List accounts, ordered by id.
///
/// ## Endpoint
///
/// `GET /accounts?pageId=1&pageSize=5`
pub async fn list_accounts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let PageQuery { page_id, page_size } = query.into_inner();

    match state.accounts.list_accounts(page_id, page_size).await {
        Ok(accounts) => HttpResponse::Ok().json(ApiResponse::success(
            PageResponse::<AccountResponse>::from_rows(accounts, page_id, page_size),
        )),
        Err(e) => error_response("List accounts", &e),
    }
}

/// Ledger entries of one account, oldest first.
///
/// ## Endpoint
///
/// `GET /accounts/{id}/entries?pageId=1&pageSize=5`
pub async fn list_account_entries(
    state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let account_id = path.into_inner();
    let PageQuery { page_id, page_size } = query.into_inner();

    match state.accounts.list_entries(account_id, page_id, page_size).await {
        Ok(entries) => HttpResponse::Ok().json(ApiResponse::success(
            PageResponse::<EntryResponse>::from_rows(entries, page_id, page_size),
        )),
        Err(e) => error_response("List entries", &e),
    }
}

/// Transfers where the account is either side.
///
/// ## Endpoint
///
/// `GET /accounts/{id}/transfers?pageId=1&pageSize=5`
pub async fn list_account_transfers(
    state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let account_id = path.into_inner();
    let PageQuery { page_id, page_size } = query.into_inner();

    match state.accounts.list_transfers(account_id, page_id, page_size).await {
        Ok(transfers) => HttpResponse::Ok().json(ApiResponse::success(
            PageResponse::<TransferResponse>::from_rows(transfers, page_id, page_size),
        )),
        Err(e) => error_response("List transfers", &e),
    }
}

/// Move money between two accounts.
///
/// ## Endpoint
///
/// `POST /transfers`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/transfers \
///   -H "Content-Type: application/json" \
///   -d '{"fromAccountId": 1, "toAccountId": 2, "amount": 3000, "currency": "USD"}'
/// ```
///
/// Returns `201 Created` with the transfer, both entries and both accounts.
/// A `409` means the transfer kept conflicting with concurrent transfers and
/// can be resubmitted.
pub async fn create_transfer(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateTransferRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    info!(
        "Transfer request: {} {} from {} to {}",
        request.amount, request.currency, request.from_account_id, request.to_account_id
    );

    match state.transfers.create_transfer(&request).await {
        Ok(result) => {
            HttpResponse::Created().json(ApiResponse::success(TransferResultResponse::from(result)))
        }
        Err(e) => error_response("Transfer", &e),
    }
}

/// Get one transfer.
///
/// ## Endpoint
///
/// `GET /transfers/{id}`
pub async fn get_transfer(state: web::Data<Arc<AppState>>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    match state.accounts.get_transfer(id).await {
        Ok(transfer) => {
            HttpResponse::Ok().json(ApiResponse::success(TransferResponse::from(transfer)))
        }
        Err(e) => error_response("Get transfer", &e),
    }
}

/// Map a [`BankError`] to its status code and error code.
pub fn error_status(e: &BankError) -> (StatusCode, String) {
    let status = match e.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Transient => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let code = match e {
        BankError::NotFound { entity, .. } => format!("{}_NOT_FOUND", entity.to_uppercase()),
        BankError::InvalidArgument(_) => "INVALID_ARGUMENT".to_string(),
        BankError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS".to_string(),
        BankError::Conflict(_) => "TRANSACTION_CONFLICT".to_string(),
        BankError::Timeout(_) => "TRANSACTION_TIMEOUT".to_string(),
        BankError::Internal(_) => "INTERNAL_ERROR".to_string(),
    };

    (status, code)
}

fn error_response(operation: &str, e: &BankError) -> HttpResponse {
    let (status, code) = error_status(e);
    if status.is_server_error() {
        error!("{} failed: {}", operation, e);
    } else {
        warn!("{} rejected: {}", operation, e);
    }

    HttpResponse::build(status).json(ApiResponse::<()>::error(&code, &e.to_string()))
}
