use super::{
    error::ApiError,
    parse_json,
    types::{AuthRequest, AuthResponse, ErrorResponse},
};
use crate::api::Services;
use axum::{body::Bytes, extract::Extension, response::Json};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, instrument};

#[utoipa::path(
    post,
    path = "/api/2.0/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Credentials accepted, session issued", body = AuthResponse),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 401, description = "Invalid credentials or not in the required group", body = ErrorResponse),
        (status = 500, description = "Directory unavailable", body = ErrorResponse),
    ),
    tag = "safeexam"
)]
#[instrument(skip_all)]
pub async fn auth(
    Extension(services): Extension<Arc<Services>>,
    body: Bytes,
) -> Result<Json<AuthResponse>, ApiError> {
    let request: AuthRequest = parse_json(&body)?;
    let password = SecretString::from(request.password);

    let valid = services
        .auth
        .login(&request.user, &password)
        .await
        .map_err(|err| ApiError::internal("directory login", err))?;

    if !valid {
        return Err(ApiError::Unauthorized);
    }

    let session_id = services
        .sessions
        .create()
        .map_err(|err| ApiError::internal("session create", err))?;

    info!("session issued");

    Ok(Json(AuthResponse { session_id }))
}
