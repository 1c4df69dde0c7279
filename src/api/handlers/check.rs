use super::{
    error::ApiError,
    parse_json,
    types::{CheckRequest, CheckResponse, ErrorResponse},
};
use crate::api::Services;
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/2.0/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Code matches the current one", body = CheckResponse),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 401, description = "Code does not match", body = CheckResponse),
    ),
    tag = "safeexam"
)]
pub async fn check(
    Extension(services): Extension<Arc<Services>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CheckRequest = parse_json(&body)?;

    // Exact comparison: case-sensitive, no trimming.
    let status = request.code == services.codes.generate().value;

    let code = if status {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    Ok((code, Json(CheckResponse { status })).into_response())
}
