//! HTTP handlers of the four flows plus health and not-found.
//!
//! Handlers are stateless; everything they share lives in the components
//! reached through [`Services`](crate::api::Services).

pub mod auth;
pub mod check;
pub mod code;
pub mod error;
pub mod health;
pub mod legacy;
pub mod not_found;
pub mod types;

pub use self::auth::auth;
pub use self::check::check;
pub use self::code::code;
pub use self::error::ApiError;
pub use self::health::health;
pub use self::legacy::legacy_check;
pub use self::not_found::not_found;

use serde::de::DeserializeOwned;

/// Decode a JSON body regardless of the declared content type.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("error decoding json: {err}")))
}
