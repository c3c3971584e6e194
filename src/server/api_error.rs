//! Error responses for the registry endpoints.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "error": "Both licenseKey and hwid are required",
//!   "code": "MISSING_FIELD",
//!   "details": { "field": "hwid" }
//! }
//! ```
//!
//! `error` is always present and human-readable. `details` is omitted when
//! there is nothing to add. Storage failures never leak driver messages.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::errors::RegistryError;
use crate::server::validation::ValidationError;

pub const MISSING_FIELDS_MESSAGE: &str = "Both licenseKey and hwid are required";
pub const NOT_FOUND_MESSAGE: &str = "Data not found for the given license key";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request body could not be parsed
    InvalidRequest,
    /// `licenseKey` or `hwid` is missing or empty
    MissingField,
    /// No records exist for the license key
    NotFound,

    // === Server Errors (5xx) ===
    /// Record store read or write failed
    DatabaseError,
    /// Server configuration error
    ConfigError,
    /// Unexpected internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::MissingField => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError | ErrorCode::ConfigError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a default human-readable message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "Request body must be a JSON object",
            ErrorCode::MissingField => MISSING_FIELDS_MESSAGE,
            ErrorCode::NotFound => NOT_FOUND_MESSAGE,
            ErrorCode::DatabaseError | ErrorCode::ConfigError | ErrorCode::InternalError => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Optional additional details (field name, parser message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Creates a new API error with the default message for `code`.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            error: code.default_message().to_string(),
            code,
            details: None,
        }
    }

    /// Adds details to an existing error.
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Missing or empty required field.
    pub fn missing_field(err: &ValidationError) -> Self {
        Self::new(ErrorCode::MissingField).details(serde_json::json!({
            "field": err.field,
            "reason": err.message,
        }))
    }

    /// No records for a license key.
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound)
    }

    /// Database error (internal details hidden from client).
    pub fn database_error() -> Self {
        Self::new(ErrorCode::DatabaseError)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.error)
    }
}

impl std::error::Error for ApiError {}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(e) => ApiError::missing_field(&e),
            RegistryError::NotFound(_) => ApiError::not_found(),
            RegistryError::Storage(_) => ApiError::database_error(),
            RegistryError::Config(_) => ApiError::new(ErrorCode::ConfigError),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequest)
            .details(serde_json::json!({ "reason": rejection.body_text() }))
    }
}
