//! # Simple Bank Backend Service
//!
//! This is the main entry point for the bank backend. It provides:
//!
//! - REST API for accounts, ledger entries and transfers
//! - Atomic, deadlock-free money transfers between accounts
//! - PostgreSQL storage, or an in-memory store for local runs
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BACKEND SERVICE                           │
//! │                                                                  │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                    REST API (Actix)                        │  │
//! │  │      /accounts   /accounts/:id/entries   /transfers        │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                          │                                       │
//! │  ┌───────────────────────┴───────────────────────────────────┐  │
//! │  │                    SERVICE LAYER                           │  │
//! │  │  ┌──────────────┐ ┌────────────────┐ ┌────────────────┐   │  │
//! │  │  │AccountService│ │TransferService │ │TransferEngine  │   │  │
//! │  │  └──────────────┘ └────────────────┘ └────────────────┘   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                          │                                       │
//! │         ┌────────────────┴────────────────┐                     │
//! │         │                                 │                      │
//! │  ┌──────┴──────┐                   ┌──────┴──────┐              │
//! │  │  PostgreSQL │                   │  In-memory  │              │
//! │  │  (PgStore)  │                   │ MemoryStore │              │
//! │  └─────────────┘                   └─────────────┘              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Set up PostgreSQL and create the database
//! 2. Copy `.env.example` to `.env` and configure
//! 3. Start the server: `cargo run` (migrations run at startup)
//!
//! Set `DATABASE_URL=memory://` to run without PostgreSQL.

use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simple_bank::api;
use simple_bank::config::AppConfig;
use simple_bank::db::{Database, MemoryStore, PgStore};
use simple_bank::AppState;

/// Main entry point for the backend service.
///
/// This function:
/// 1. Initializes logging
/// 2. Loads configuration from environment
/// 3. Opens the store and runs migrations
/// 4. Launches the HTTP server
#[actix_web::main]
async fn main() -> io::Result<()> {
    // =========================================
    // STEP 1: Initialize Logging
    // =========================================
    // RUST_LOG overrides the default level, e.g. RUST_LOG=simple_bank=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("🚀 Starting Simple Bank Backend Service");

    // =========================================
    // STEP 2: Load Configuration
    // =========================================
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    let config = AppConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("📋 Configuration loaded");
    info!("   Isolation level: {}", config.isolation_level);
    info!("   Transfer timeout: {:?}", config.transfer_timeout);
    info!("   Reject overdraft: {}", config.reject_overdraft);

    // =========================================
    // STEP 3: Initialize Store
    // =========================================
    let app_state = if config.uses_memory_store() {
        info!("🗄️  Using in-memory store, data is lost on exit");
        AppState::new(Arc::new(MemoryStore::new()), config.clone())
    } else {
        let db = Database::connect(
            &config.database_url,
            config.db_pool_size,
            config.transfer_timeout,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string())
        })?;

        info!("🗄️  Database connected");

        // Run migrations to ensure schema is up to date
        db.run_migrations().await.map_err(|e| {
            error!("Failed to run migrations: {}", e);
            io::Error::new(io::ErrorKind::Other, e.to_string())
        })?;

        info!("📦 Database migrations complete");

        AppState::new(Arc::new(PgStore::new(db, config.isolation_level)), config.clone())
    };

    let app_state = Arc::new(app_state);

    // =========================================
    // STEP 4: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        App::new()
            // Attach shared application state
            .app_data(web::Data::new(app_state.clone()))

            // Add logging middleware
            .wrap(middleware::Logger::default())

            // Configure API routes
            .configure(api::configure_routes)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
