//! Successful response shapes.
//!
//! Handlers return `Result<Reply<T, C>, ApiError>`: `Reply::Success` maps to
//! 200, `Reply::Conflict` to 409, and `ApiError` carries the client (4xx) and
//! server (5xx) cases. Callers branch on status to tell data from conflict.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::server::database::BindingRecord;

pub const STORED_MESSAGE: &str = "Data stored successfully";
pub const RETRIEVED_MESSAGE: &str = "Data retrieved successfully";
pub const CONFLICT_MESSAGE: &str = "Multiple HWIDs found for the same license key";

/// Body of `POST /store` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StoredResponse {
    pub message: String,
}

impl StoredResponse {
    pub fn stored() -> Self {
        Self {
            message: STORED_MESSAGE.to_string(),
        }
    }
}

/// Body of `GET /{licenseKey}` when the key has a single HWID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LookupResponse {
    pub message: String,
    pub data: Vec<BindingRecord>,
}

impl LookupResponse {
    pub fn retrieved(data: Vec<BindingRecord>) -> Self {
        Self {
            message: RETRIEVED_MESSAGE.to_string(),
            data,
        }
    }
}

/// Body of a 409 response.
///
/// `C` is `ConflictGroup` for the full listing and `BindingRecord` for a
/// single-key lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConflictBody<C> {
    pub error: String,
    pub conflicting_records: Vec<C>,
}

impl<C> ConflictBody<C> {
    pub fn new(conflicting_records: Vec<C>) -> Self {
        Self {
            error: CONFLICT_MESSAGE.to_string(),
            conflicting_records,
        }
    }
}

/// Non-error outcome of a handler.
#[derive(Debug, Clone)]
pub enum Reply<T, C> {
    Success(T),
    Conflict(ConflictBody<C>),
}

impl<T, C> Reply<T, C> {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Reply::Success(_) => StatusCode::OK,
            Reply::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl<T: Serialize, C: Serialize> IntoResponse for Reply<T, C> {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Reply::Success(body) => (status, Json(body)).into_response(),
            Reply::Conflict(body) => (status, Json(body)).into_response(),
        }
    }
}
