//! # Database Module
//!
//! This module handles all storage for the bank backend:
//!
//! - Accounts (owner, currency, balance)
//! - Ledger entries (append-only, one per account per transfer)
//! - Transfers (append-only)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      DATABASE LAYER                              │
//! │                                                                  │
//! │      Repository            TxStore / StoreTx      TxCoordinator  │
//! │   (single statements)     (unit of work)       (commit/rollback) │
//! │            │                      │                     │        │
//! │            └──────────┬───────────┴─────────────────────┘        │
//! │                       ▼                                          │
//! │        ┌──────────────────────────────┐                          │
//! │        │  PgStore      │ MemoryStore  │                          │
//! │        │  (deadpool)   │ (in-process) │                          │
//! │        └──────────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod coordinator;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod queries;
pub mod store;

use std::time::Duration;

use deadpool_postgres::{Config, Pool, PoolConfig, Runtime, Timeouts};
use tokio_postgres::{Config as TokioConfig, NoTls};
use tracing::{debug, error, info};

use crate::errors::BankError;

pub use coordinator::TxCoordinator;
pub use memory::MemoryStore;
pub use models::*;
pub use postgres::{IsolationLevel, PgStore};
pub use store::{Repository, StoreTx, TxStore};

/// Database connection wrapper.
///
/// Wraps the deadpool connection pool. Cloning is cheap.
///
/// ## Usage
///
/// ```rust,ignore
/// let db = Database::connect("postgres://...", 10, Duration::from_secs(5)).await?;
/// db.run_migrations().await?;
/// let store = PgStore::new(db, IsolationLevel::ReadCommitted);
/// ```
#[derive(Clone)]
pub struct Database {
    /// The connection pool
    pool: Pool,
}

impl Database {
    /// Connect to the PostgreSQL database.
    ///
    /// ## Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    /// * `max_size` - Maximum number of pooled connections
    /// * `wait_timeout` - Longest wait for a free connection, after which
    ///   the checkout fails with a retryable `Conflict`
    ///
    /// ## Returns
    ///
    /// * `Ok(Database)` - Connected and answered `SELECT 1`
    /// * `Err(BankError::Internal)` - Bad URL or unreachable server
    pub async fn connect(
        database_url: &str,
        max_size: usize,
        wait_timeout: Duration,
    ) -> Result<Self, BankError> {
        info!("Connecting to database...");

        let tokio_config = database_url
            .parse::<TokioConfig>()
            .map_err(|e| BankError::Internal(format!("Invalid database URL: {}", e)))?;

        // Convert to deadpool config
        let mut config = Config::new();

        if let Some(dbname) = tokio_config.get_dbname() {
            config.dbname = Some(dbname.to_string());
        }
        if let Some(user) = tokio_config.get_user() {
            config.user = Some(user.to_string());
        }
        if let Some(password) = tokio_config.get_password() {
            config.password = Some(String::from_utf8_lossy(password).to_string());
        }
        if let Some(tokio_postgres::config::Host::Tcp(host)) = tokio_config.get_hosts().first() {
            config.host = Some(host.clone());
        }
        if let Some(port) = tokio_config.get_ports().first() {
            config.port = Some(*port);
        }

        // Checkouts give up after `wait_timeout` instead of queueing forever.
        config.pool = Some(PoolConfig {
            max_size,
            timeouts: Timeouts {
                wait: Some(wait_timeout),
                create: Some(wait_timeout),
                ..Default::default()
            },
            ..Default::default()
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| BankError::Internal(format!("Database connection failed: {}", e)))?;

        // Test connection
        let client = pool.get().await?;
        client.query("SELECT 1", &[]).await?;

        info!("Database connection established (pool size {})", max_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// The schema script only uses `IF NOT EXISTS`, so running it on every
    /// start is safe.
    ///
    /// ## Migration Files
    ///
    /// ```text
    /// migrations/
    /// └── 001_initial_schema.sql
    /// ```
    pub async fn run_migrations(&self) -> Result<(), BankError> {
        info!("Running database migrations...");

        let client = self.pool.get().await?;

        let migration_paths = [
            "migrations/001_initial_schema.sql",
            "backend/migrations/001_initial_schema.sql",
            "./backend/migrations/001_initial_schema.sql",
        ];

        let mut migration_sql = None;
        for path in &migration_paths {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    info!("Found migration file at: {}", path);
                    migration_sql = Some(content);
                    break;
                }
                Err(e) => {
                    debug!("Tried path '{}': {}", path, e);
                }
            }
        }

        let migration_sql = migration_sql.ok_or_else(|| {
            let current_dir = std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            error!(
                "Could not find migration file. Current dir: {}. Tried paths: {:?}",
                current_dir, migration_paths
            );
            BankError::Internal(format!(
                "Could not find migration file. Current directory: {}",
                current_dir
            ))
        })?;

        if let Err(e) = client.batch_execute(&migration_sql).await {
            let detail = e
                .as_db_error()
                .and_then(|db_err| db_err.detail())
                .unwrap_or("No detail available")
                .to_string();
            error!("Migration execution error: {} ({})", e, detail);
            return Err(BankError::Internal(format!("Migration failed: {}", e)));
        }

        info!("Migrations completed successfully");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}
