//! # Simple Bank Backend
//!
//! Accounts, an append-only ledger, and an atomic funds transfer engine
//! behind a small REST API.
//!
//! ## Module Map
//!
//! | Module | Contents |
//! |--------|----------|
//! | `db` | Store traits, PostgreSQL and in-memory stores, transaction coordinator |
//! | `services` | Transfer engine, transfer and account services |
//! | `api` | Actix routes and handlers |
//! | `models` | Request and response bodies |
//! | `config` | Environment configuration |
//! | `errors` | `BankError` and its classification |

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

use config::AppConfig;
use db::{Repository, TxCoordinator, TxStore};
use services::{AccountService, TransferEngine, TransferService};

/// Application state shared across all handlers.
///
/// Handlers receive it as `web::Data<Arc<AppState>>`.
pub struct AppState {
    /// Account and ledger queries
    pub accounts: AccountService,

    /// Transfer validation and execution
    pub transfers: TransferService,

    /// Application configuration
    pub config: AppConfig,
}

impl AppState {
    /// Wire the services on top of one store.
    pub fn new<S>(store: Arc<S>, config: AppConfig) -> Self
    where
        S: Repository + TxStore + 'static,
    {
        let repo: Arc<dyn Repository> = store.clone();
        let tx_store: Arc<dyn TxStore> = store;

        let coordinator = TxCoordinator::new(tx_store, config.transfer_timeout);
        let engine = TransferEngine::new(coordinator, config.reject_overdraft);

        Self {
            accounts: AccountService::new(repo.clone(), config.max_page_size),
            transfers: TransferService::new(
                repo,
                engine,
                config.transfer_max_retries,
                config.transfer_retry_backoff,
            ),
            config,
        }
    }
}
