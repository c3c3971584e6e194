use thiserror::Error;

use crate::server::validation::ValidationError;

/// Errors produced by the registry.
///
/// Conflicting bindings are not represented here: a conflict is a successful
/// detection that changes the response shape, see `server::response::Reply`.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Required input was missing or malformed. Never reaches the store.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No records exist for the requested license key.
    #[error("no records found for license key '{0}'")]
    NotFound(String),

    /// The record store was unreachable or a read/write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
