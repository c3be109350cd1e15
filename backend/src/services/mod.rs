//! # Services Module
//!
//! This module contains the business logic of the bank backend.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `TransferEngine` | Atomic funds transfer inside one transaction |
//! | `TransferService` | Request validation, retry on transient errors |
//! | `AccountService` | Opening accounts, listings, ledger reads |
//!
//! ## Service Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SERVICES LAYER                            │
//! │                                                                  │
//! │  ┌────────────────────────┐        ┌────────────────────────┐   │
//! │  │    TransferService     │        │     AccountService     │   │
//! │  │  • create_transfer()   │        │  • create_account()    │   │
//! │  │  • retry + backoff     │        │  • list_accounts()     │   │
//! │  └───────────┬────────────┘        │  • list_entries()      │   │
//! │              ▼                     └───────────┬────────────┘   │
//! │  ┌────────────────────────┐                    │                │
//! │  │    TransferEngine      │                    │                │
//! │  │  • transfer_tx()       │                    │                │
//! │  └───────────┬────────────┘                    │                │
//! │              ▼                                 ▼                │
//! │       TxCoordinator / TxStore             Repository            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod account_service;
pub mod transfer_engine;
pub mod transfer_service;

pub use account_service::AccountService;
pub use transfer_engine::TransferEngine;
pub use transfer_service::TransferService;
