//! Typed decode-and-validate helpers for the JSON endpoints.
//!
//! A response body is first deserialized into a typed struct with `serde`,
//! which rejects missing fields and wrong types. Constraints serde cannot
//! express (literal values, URL schemes) are then checked through
//! [`Validate`]. Both failures are reported as [`SchemaError`], kept apart
//! from transport errors so callers can tell a bad response from no
//! response.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected value for `{field}`: {reason}")]
    Mismatch { field: &'static str, reason: String },
}

pub trait Validate {
    fn validate(&self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Deserialize `body` as `T` and run its extra checks.
pub fn decode<T>(body: &str) -> Result<T, SchemaError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(body)?;
    value.validate()?;
    Ok(value)
}

/// Like [`decode`], for a value already pulled out of a larger document.
pub fn decode_value<T>(value: serde_json::Value) -> Result<T, SchemaError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_value(value)?;
    value.validate()?;
    Ok(value)
}

/// For optional fields that must not be `null` when present. Pair with
/// `#[serde(default)]` so a missing field still gives `None`.
pub fn present_non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn expect_literal(field: &'static str, actual: &str, expected: &str) -> Result<(), SchemaError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SchemaError::Mismatch {
            field,
            reason: format!("expected {:?}, got {:?}", expected, actual),
        })
    }
}

pub fn expect_http_url(field: &'static str, url: &Url) -> Result<(), SchemaError> {
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        scheme => Err(SchemaError::Mismatch {
            field,
            reason: format!("expected an http(s) URL, got scheme {:?}", scheme),
        }),
    }
}
