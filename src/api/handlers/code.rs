use super::{
    error::ApiError,
    types::{unix_nanos, CodeResponse, ErrorResponse},
};
use crate::api::Services;
use axum::{extract::Extension, http::HeaderMap, response::Json};
use std::{sync::Arc, time::SystemTime};

pub const SESSION_HEADER: &str = "x-session-key";

#[utoipa::path(
    get,
    path = "/api/2.0/code",
    params(
        ("X-Session-Key" = String, Header, description = "Session id returned by /api/2.0/auth"),
    ),
    responses(
        (status = 200, description = "Current code", body = CodeResponse),
        (status = 400, description = "Missing X-Session-Key header", body = ErrorResponse),
        (status = 401, description = "Unknown or expired session", body = ErrorResponse),
    ),
    tag = "safeexam"
)]
pub async fn code(
    Extension(services): Extension<Arc<Services>>,
    headers: HeaderMap,
) -> Result<Json<CodeResponse>, ApiError> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest("X-Session-Key header empty".to_string()))?;

    if !services.sessions.check(session_id) {
        return Err(ApiError::Unauthorized);
    }

    let record = services.codes.generate();

    Ok(Json(CodeResponse {
        code: record.value,
        expires: unix_nanos(record.expires_at),
        server_time: unix_nanos(SystemTime::now()),
    }))
}
