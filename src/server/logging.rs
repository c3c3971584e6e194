//! Logging for the registry server.
//!
//! This module provides:
//! - Subscriber setup from `LoggingConfig`
//! - Structured binding events (stored, retrieved, not found, conflict)
//! - Request middleware with request ID tracking and timing
//!
//! # Usage
//!
//! ```rust,ignore
//! use axum::middleware;
//! use hwid_registry::server::logging::request_logging_middleware;
//!
//! let app = Router::new()
//!     .route("/data", get(list_bindings_handler))
//!     .layer(middleware::from_fn(request_logging_middleware));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Response},
    middleware::Next,
};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Binding event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    /// A new license key / HWID pair was stored
    Stored,
    /// Bindings for a license key were returned
    Retrieved,
    /// A lookup found no bindings
    NotFound,
    /// A license key was seen with more than one HWID
    ConflictDetected,
}

impl std::fmt::Display for BindingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BindingEvent::Stored => "stored",
            BindingEvent::Retrieved => "retrieved",
            BindingEvent::NotFound => "not_found",
            BindingEvent::ConflictDetected => "conflict_detected",
        };
        write!(f, "{}", s)
    }
}

/// Log a binding event.
///
/// Conflicts and misses are logged at `warn`, everything else at `info`.
///
/// # Arguments
///
/// * `event` - The type of binding event
/// * `license_key` - The license key involved
/// * `details` - Optional additional details (HWID, record count)
pub fn log_binding_event(event: BindingEvent, license_key: &str, details: Option<&str>) {
    let span = info_span!(
        "binding_event",
        event = %event,
        license_key = %license_key,
    );
    let _enter = span.enter();

    match event {
        BindingEvent::ConflictDetected | BindingEvent::NotFound => {
            if let Some(d) = details {
                warn!(details = %d, "Binding event occurred");
            } else {
                warn!("Binding event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "Binding event occurred");
            } else {
                info!("Binding event occurred");
            }
        }
    }
}

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Generate a new unique request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging middleware that tracks request timing and generates request IDs.
///
/// This middleware:
/// 1. Generates a unique request ID for each incoming request
/// 2. Creates a tracing span with the request ID
/// 3. Measures and logs the response status and time
/// 4. Adds the request ID to the response headers
pub async fn request_logging_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = generate_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let start = Instant::now();

    let response = async move {
        info!("Started processing request");
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let status = response.status();

    let _enter = span.enter();
    if status.is_server_error() {
        warn!(
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_valid_uuid() {
        let id = generate_request_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }

    #[test]
    fn event_names() {
        assert_eq!(BindingEvent::Stored.to_string(), "stored");
        assert_eq!(
            BindingEvent::ConflictDetected.to_string(),
            "conflict_detected"
        );
    }

    #[test]
    fn init_tracing_twice_does_not_panic() {
        let config = LoggingConfig::default();
        init_tracing(&config);
        init_tracing(&config);
    }
}
