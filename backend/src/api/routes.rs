//! # API Route Configuration
//!
//! This module sets up all the HTTP routes for the API.

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};

use super::handlers;
use crate::models::ApiResponse;

/// Configure all API routes.
///
/// This function is called from main.rs to set up
/// all the endpoint routes.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                   GET - Health check
/// ├── /accounts                 POST - Open account
/// │   ├──                       GET - List accounts
/// │   ├── /:id                  GET - Get account
/// │   ├── /:id/entries          GET - Ledger entries
/// │   └── /:id/transfers        GET - Transfers touching the account
/// └── /transfers                POST - Transfer money
///     └── /:id                  GET - Get transfer
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Malformed bodies, query strings and path ids get the standard error shape
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let response = HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error("INVALID_REQUEST", &err.to_string()));
            InternalError::from_response(err, response).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            let response = HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error("INVALID_REQUEST", &err.to_string()));
            InternalError::from_response(err, response).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            let response = HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error("INVALID_REQUEST", &err.to_string()));
            InternalError::from_response(err, response).into()
        }))

        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))

        // Health check endpoint
        .route("/health", web::get().to(handlers::health_check))

        // Account endpoints
        .service(
            web::scope("/accounts")
                .route("", web::post().to(handlers::create_account))
                .route("", web::get().to(handlers::list_accounts))
                .route("/{id}", web::get().to(handlers::get_account))
                .route("/{id}/entries", web::get().to(handlers::list_account_entries))
                .route("/{id}/transfers", web::get().to(handlers::list_account_transfers)),
        )

        // Transfer endpoints
        .service(
            web::scope("/transfers")
                .route("", web::post().to(handlers::create_transfer))
                .route("/{id}", web::get().to(handlers::get_transfer)),
        );
}
