//! OpenAPI documentation for the registry API.
//!
//! Enabled with the `openapi` feature. `build_router` serves the document at
//! `/api-docs/openapi.json` and a Swagger UI at `/swagger-ui`.

use utoipa::OpenApi;

/// OpenAPI documentation for the HWID registry.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HWID Registry API",
        version = "0.1.0",
        description = "Binds license keys to hardware IDs and reports license keys seen with more than one HWID.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "bindings", description = "Store and query license key / HWID bindings")
    ),
    paths(
        crate::server::handlers::store_binding_handler,
        crate::server::handlers::list_bindings_handler,
        crate::server::handlers::lookup_binding_handler,
    ),
    components(
        schemas(
            crate::server::handlers::StoreRequest,
            crate::server::database::BindingRecord,
            crate::conflict::ConflictGroup,
            crate::server::response::StoredResponse,
            crate::server::response::LookupResponse,
            crate::server::api_error::ApiError,
            crate::server::api_error::ErrorCode,
        )
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI document.
pub fn get_openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
