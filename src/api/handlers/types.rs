//! Request/response bodies of the JSON API.
//!
//! Field names are the ones deployed exam clients send and expect, so they are
//! spelled out explicitly instead of following Rust naming.

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize)]
pub struct AuthRequest {
    #[serde(rename = "User")]
    pub user: String,
    /// Also read from `Password`.
    #[serde(rename = "Passwd")]
    pub password: String,
}

impl<'de> Deserialize<'de> for AuthRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [user, password] = deserializer.deserialize_map(LooseFields {
            fields: [&["user"], &["passwd", "password"]],
        })?;
        Ok(Self { user, password })
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    #[serde(rename = "SessionID")]
    pub session_id: String,
}

/// Current code, its expiry and the server clock, in nanoseconds since the Unix epoch.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct CodeResponse {
    pub code: String,
    pub expires: i64,
    pub server_time: i64,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct CheckRequest {
    #[serde(rename = "Code")]
    pub code: String,
}

impl<'de> Deserialize<'de> for CheckRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [code] = deserializer.deserialize_map(LooseFields {
            fields: [&["code"]],
        })?;
        Ok(Self { code })
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CheckResponse {
    pub status: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
}

/// String members of a request object, looked up the way existing clients
/// expect: keys match case-insensitively, `null` or an absent member reads as
/// empty, unknown members are skipped and a repeated key keeps its last value.
struct LooseFields<const N: usize> {
    fields: [&'static [&'static str]; N],
}

impl<'de, const N: usize> Visitor<'de> for LooseFields<N> {
    type Value = [String; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut values: [String; N] = std::array::from_fn(|_| String::new());

        while let Some(key) = map.next_key::<String>()? {
            let slot = self
                .fields
                .iter()
                .position(|names| names.iter().any(|name| name.eq_ignore_ascii_case(&key)));

            match slot {
                Some(index) => {
                    values[index] = map.next_value::<Option<String>>()?.unwrap_or_default();
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(values)
    }
}

/// Nanoseconds between the Unix epoch and `time`, negative before the epoch.
#[must_use]
pub fn unix_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_nanos()).unwrap_or(i64::MAX),
        Err(err) => i64::try_from(err.duration().as_nanos()).map_or(i64::MIN, |nanos| -nanos),
    }
}
