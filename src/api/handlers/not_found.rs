use super::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Anything under the API root that no route serves, wrong methods included.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Router-wide fallback: the JSON envelope below `api_root`, a bare 404 elsewhere.
pub fn fallback(api_root: &str, path: &str) -> Response {
    if is_api_path(api_root, path) {
        ApiError::NotFound.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn is_api_path(api_root: &str, path: &str) -> bool {
    path.strip_prefix(api_root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
