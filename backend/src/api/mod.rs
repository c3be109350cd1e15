//! # REST API Module
//!
//! This module defines all HTTP endpoints for the Simple Bank API.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/accounts` | Open account |
//! | GET | `/accounts` | List accounts |
//! | GET | `/accounts/:id` | Get account |
//! | GET | `/accounts/:id/entries` | Ledger entries |
//! | GET | `/accounts/:id/transfers` | Transfers of an account |
//! | POST | `/transfers` | Transfer money |
//! | GET | `/transfers/:id` | Get transfer |
//! | GET | `/health` | Health check |
//!
//! ## Request/Response Format
//!
//! All requests and responses use JSON:
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... }
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "error": {
//!         "code": "ERROR_CODE",
//!         "message": "Human readable message"
//!     }
//! }
//! ```

pub mod routes;
pub mod handlers;

pub use routes::configure_routes;
