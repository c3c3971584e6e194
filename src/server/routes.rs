use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

use crate::server::handlers::{
    list_bindings_handler, lookup_binding_handler, lookup_store_key_handler,
    store_binding_handler, AppState,
};
use crate::server::logging::request_logging_middleware;

/// Build the main application router for the registry server.
///
/// # Routes
///
/// - `POST /store` - Store a license key / HWID binding
/// - `GET /data` - List every binding, or the conflicts if any exist
/// - `GET /{licenseKey}` - Look up the bindings of one license key
///
/// With the `openapi` feature:
/// - `GET /api-docs/openapi.json` - OpenAPI document
/// - `GET /swagger-ui` - Swagger UI
///
/// Static paths take priority over the key lookup, so `/data` can never be
/// looked up as a license key. `GET /store` still reaches the lookup of the
/// key `store`.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route(
            "/store",
            post(store_binding_handler).get(lookup_store_key_handler),
        )
        .route("/data", get(list_bindings_handler))
        .route("/:license_key", get(lookup_binding_handler));

    #[cfg(feature = "openapi")]
    let router = {
        use utoipa_swagger_ui::SwaggerUi;

        router.merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::server::openapi::get_openapi()),
        )
    };

    router
        .layer(ServiceBuilder::new().layer(middleware::from_fn(request_logging_middleware)))
        .with_state(state)
}
