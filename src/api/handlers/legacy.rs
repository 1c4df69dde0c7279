use crate::api::Services;
use axum::{
    extract::{Extension, RawQuery},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use url::form_urlencoded;

/// Plain-text check kept for clients that predate the JSON API.
///
/// Answers `true` on a match; every other outcome is a bare status with its
/// reason phrase as body.
#[utoipa::path(
    get,
    path = "/check",
    params(
        ("pass" = String, Query, description = "Code typed in by the candidate"),
    ),
    responses(
        (status = 200, description = "Code matches", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing pass parameter", body = String, content_type = "text/plain"),
        (status = 401, description = "Code does not match", body = String, content_type = "text/plain"),
    ),
    tag = "legacy"
)]
pub async fn legacy_check(
    Extension(services): Extension<Arc<Services>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let Some(pass) = query.as_deref().and_then(first_pass) else {
        return (StatusCode::BAD_REQUEST, "Bad Request");
    };

    if pass == services.codes.generate().value {
        (StatusCode::OK, "true")
    } else {
        (StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

/// First `pass` value of the query string; an empty value counts as missing.
fn first_pass(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "pass")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
