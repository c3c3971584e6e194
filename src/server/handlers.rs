use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::conflict::{ConflictGroup, KeyOutcome, ListingOutcome};
use crate::errors::{RegistryError, RegistryResult};
use crate::server::api_error::ApiError;
use crate::server::database::{BindingRecord, Database, NewBinding};
use crate::server::logging::{log_binding_event, BindingEvent};
use crate::server::response::{ConflictBody, LookupResponse, Reply, StoredResponse};
use crate::server::validation::validate_required;

/// License key answered by `GET /store`.
const STORE_KEY: &str = "store";

/// Shared application state for handlers.
///
/// Cloned into every request; the database pool is the only shared resource.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Request body for `POST /store`.
///
/// Both fields are optional at the parsing layer so that a missing field is
/// reported as a validation failure rather than a body rejection.
#[derive(Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
}

impl StoreRequest {
    /// Check both fields are present and non-empty.
    pub fn into_binding(self) -> RegistryResult<NewBinding> {
        let license_key = validate_required(self.license_key.as_deref(), "licenseKey")?;
        let hwid = validate_required(self.hwid.as_deref(), "hwid")?;
        Ok(NewBinding::new(license_key, hwid))
    }
}

/// Handler for storing a license key / HWID binding.
///
/// Behavior:
/// - Missing or empty `licenseKey`/`hwid` → 400, nothing is written.
/// - Otherwise a new record is appended; earlier records for the key are kept.
/// - DB errors → 500 with an opaque body.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/store",
    tag = "bindings",
    request_body = StoreRequest,
    responses(
        (status = 200, description = "Binding stored", body = StoredResponse),
        (status = 400, description = "Missing field or malformed body", body = ApiError),
        (status = 500, description = "Storage failure", body = ApiError)
    )
))]
pub async fn store_binding_handler(
    State(state): State<AppState>,
    payload: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<StoredResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!("Rejected /store body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    let binding = payload.into_binding().map_err(|e| {
        warn!("Rejected /store request: {e}");
        e
    })?;

    state.db.insert_binding(&binding).await?;

    log_binding_event(
        BindingEvent::Stored,
        &binding.license_key,
        Some(binding.hwid.as_str()),
    );

    Ok(Json(StoredResponse::stored()))
}

/// Handler for listing every binding.
///
/// Returns the full listing only when no license key has more than one HWID.
/// A single conflicting key turns the whole response into a 409 that lists
/// each conflicting key with all of its records; non-conflicting records are
/// not returned in that case.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/data",
    tag = "bindings",
    responses(
        (status = 200, description = "All bindings", body = Vec<BindingRecord>),
        (status = 409, description = "At least one license key has several HWIDs", body = ConflictBody<ConflictGroup>),
        (status = 500, description = "Storage failure", body = ApiError)
    )
))]
pub async fn list_bindings_handler(
    State(state): State<AppState>,
) -> Result<Reply<Vec<BindingRecord>, ConflictGroup>, ApiError> {
    let records = state.db.list_bindings().await?;

    match ListingOutcome::from_snapshot(records) {
        ListingOutcome::Clean(records) => {
            info!("Listing {} bindings", records.len());
            Ok(Reply::Success(records))
        }
        ListingOutcome::Conflicted(groups) => {
            for group in &groups {
                log_binding_event(
                    BindingEvent::ConflictDetected,
                    &group.license_key,
                    Some(format!("{} records", group.records.len()).as_str()),
                );
            }
            Ok(Reply::Conflict(ConflictBody::new(groups)))
        }
    }
}

/// Handler for looking up the bindings of one license key.
///
/// - No records → 404.
/// - More than one distinct HWID → 409 with every matched record.
/// - Otherwise → 200 with the matched records.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/{license_key}",
    tag = "bindings",
    params(("license_key" = String, Path, description = "License key to look up")),
    responses(
        (status = 200, description = "Bindings for the key", body = LookupResponse),
        (status = 404, description = "No bindings for the key", body = ApiError),
        (status = 409, description = "The key has several HWIDs", body = ConflictBody<BindingRecord>),
        (status = 500, description = "Storage failure", body = ApiError)
    )
))]
pub async fn lookup_binding_handler(
    State(state): State<AppState>,
    Path(license_key): Path<String>,
) -> Result<Reply<LookupResponse, BindingRecord>, ApiError> {
    lookup_key(&state, license_key).await
}

/// `GET /store` is a lookup of the license key `store`.
///
/// The static `/store` route shadows `/:license_key` for every method, so
/// without this a key stored as `store` could never be read back.
pub async fn lookup_store_key_handler(
    State(state): State<AppState>,
) -> Result<Reply<LookupResponse, BindingRecord>, ApiError> {
    lookup_key(&state, STORE_KEY.to_string()).await
}

async fn lookup_key(
    state: &AppState,
    license_key: String,
) -> Result<Reply<LookupResponse, BindingRecord>, ApiError> {
    let records = state.db.find_bindings_by_key(&license_key).await?;

    match KeyOutcome::from_matches(records) {
        KeyOutcome::Missing => {
            log_binding_event(BindingEvent::NotFound, &license_key, None);
            Err(RegistryError::NotFound(license_key).into())
        }
        KeyOutcome::Conflicted(records) => {
            log_binding_event(
                BindingEvent::ConflictDetected,
                &license_key,
                Some(format!("{} records", records.len()).as_str()),
            );
            Ok(Reply::Conflict(ConflictBody::new(records)))
        }
        KeyOutcome::Bound(records) => {
            log_binding_event(BindingEvent::Retrieved, &license_key, None);
            Ok(Reply::Success(LookupResponse::retrieved(records)))
        }
    }
}
