use super::handlers::{
    self,
    types::{AuthRequest, AuthResponse, CheckRequest, CheckResponse, CodeResponse, ErrorResponse},
};
use utoipa::OpenApi;

// Title, version, description, contact and license come from Cargo metadata.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::auth,
        handlers::code::code,
        handlers::check::check,
        handlers::legacy::legacy_check,
        handlers::health::health,
    ),
    components(schemas(
        AuthRequest,
        AuthResponse,
        CodeResponse,
        CheckRequest,
        CheckResponse,
        ErrorResponse,
        handlers::health::Health,
    )),
    tags(
        (name = "safeexam", description = "Session login, code fetch and code check"),
        (name = "legacy", description = "Plain-text check for older clients"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
