// src/server/mod.rs

//! Server-side components for the registry.
//!
//! This module contains:
//! - `database`    → record store over SQLite/Postgres
//! - `handlers`    → Axum HTTP handlers for the three endpoints
//! - `response`    → success and conflict response shapes
//! - `api_error`   → client/server error responses
//! - `routes`      → router builder
//! - `logging`     → tracing setup, binding events, request middleware
//! - `validation`  → request validation utilities
//! - `openapi`     → OpenAPI document (requires `openapi` feature)

pub mod api_error;
pub mod database;
pub mod handlers;
pub mod logging;
pub mod response;
pub mod routes;
pub mod validation;

#[cfg(feature = "openapi")]
pub mod openapi;

pub use api_error::{ApiError, ErrorCode};
pub use database::{BindingRecord, Database, NewBinding};
pub use handlers::{
    list_bindings_handler, lookup_binding_handler, lookup_store_key_handler, store_binding_handler,
    AppState, StoreRequest,
};
pub use response::{ConflictBody, LookupResponse, Reply, StoredResponse};
pub use routes::build_router;
pub use validation::{validate_not_empty, validate_required, ValidationError, ValidationResult};
