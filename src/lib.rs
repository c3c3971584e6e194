//! HWID Registry - binds software license keys to hardware identifiers.
//!
//! Every `POST /store` appends a `(licenseKey, hwid)` record. Nothing prevents
//! a key from collecting several HWIDs; the query endpoints detect that case
//! and answer with `409 Conflict` instead of the data.
//!
//! # Features
//!
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//! - `openapi` - OpenAPI document and Swagger UI.
//!
//! # Example
//!
//! ```toml
//! # Server with PostgreSQL
//! hwid-registry = { version = "0.1", features = ["postgres"] }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one database backend: `sqlite` or `postgres`");

pub mod config;
pub mod conflict;
pub mod errors;

#[path = "server/mod.rs"]
pub mod server;
