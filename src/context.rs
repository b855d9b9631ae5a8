use serde::Deserialize;

use crate::{
    schema::{self, SchemaError, Validate},
    util::{Transport, TransportError},
};

pub const CONTEXT_URL: &str = "http://tvplayer.com/watch/context";

/// Short-lived values authorizing a single stream data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub validation_token: String,
    pub session_token: Option<String>,
    pub platform_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ContextResponse {
    validate: String,
    #[serde(default, deserialize_with = "schema::present_non_null")]
    token: Option<String>,
    platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Platform {
    key: String,
}

impl Validate for ContextResponse {}

impl From<ContextResponse> for SessionContext {
    fn from(resp: ContextResponse) -> Self {
        Self {
            validation_token: resp.validate,
            session_token: resp.token,
            platform_key: resp.platform.key,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ContextError {
    #[error("context request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid context response: {0}")]
    Schema(#[from] SchemaError),
}

pub async fn resolve_context<T>(
    transport: &T,
    resource: &str,
    token: &str,
) -> Result<SessionContext, ContextError>
where
    T: Transport + ?Sized,
{
    debug!("Getting stream information for resource={}", resource);
    let resp = transport
        .get(CONTEXT_URL, &[("resource", resource), ("gen", token)])
        .await?
        .error_for_status()?;

    let context: ContextResponse = schema::decode(&resp.body)?;
    Ok(context.into())
}
