use super::types::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::error::Error;
use tracing::{debug, error};

type BoxError = Box<dyn Error + Send + Sync>;

/// Failure outcomes of the JSON API, rendered as `{"Code": .., "Error": ..}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("{operation} failed")]
    Internal {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    pub fn internal(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            operation,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Internal { operation, source } => {
                error!("{} failed: {}", operation, chain(source.as_ref()));
            }
            Self::BadRequest(reason) => debug!("bad request: {}", reason),
            Self::Unauthorized | Self::NotFound => debug!("{}", self),
        }

        let body = ErrorResponse {
            code: status.as_u16(),
            error: status.canonical_reason().unwrap_or_default().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

fn chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}
