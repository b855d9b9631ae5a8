use serde::Deserialize;
use url::Url;

use crate::{
    context::SessionContext,
    schema::{self, SchemaError, Validate},
    util::{Transport, TransportError},
};

pub const API_URL: &str = "http://api.tvplayer.com/api/v2/stream/live";

const STATUS_OK: &str = "200 OK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub manifest_url: Url,
    pub drm_token: Option<String>,
}

impl StreamDescriptor {
    pub fn is_drm_protected(&self) -> bool {
        self.drm_token.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    tvplayer: ApiBody,
}

#[derive(Debug, Deserialize)]
struct ApiBody {
    status: String,
    #[serde(default)]
    response: serde_json::Value,
}

impl Validate for Envelope {
    fn validate(&self) -> Result<(), SchemaError> {
        schema::expect_literal("tvplayer.status", &self.tvplayer.status, STATUS_OK)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamResponse {
    stream: Url,
    #[serde(default)]
    drm_token: Option<String>,
}

impl Validate for StreamResponse {
    fn validate(&self) -> Result<(), SchemaError> {
        schema::expect_http_url("tvplayer.response.stream", &self.stream)
    }
}

impl From<StreamResponse> for StreamDescriptor {
    fn from(resp: StreamResponse) -> Self {
        Self {
            manifest_url: resp.stream,
            // An empty token carries no DRM metadata.
            drm_token: resp.drm_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StreamDataError {
    #[error("stream data request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid stream data response: {0}")]
    Schema(#[from] SchemaError),
}

pub async fn fetch_stream_data<T>(
    transport: &T,
    context: &SessionContext,
    resource: &str,
    service_id: u32,
) -> Result<StreamDescriptor, StreamDataError>
where
    T: Transport + ?Sized,
{
    let service = service_id.to_string();
    let mut form = vec![
        ("service", service.as_str()),
        ("id", resource),
        ("validate", context.validation_token.as_str()),
    ];
    if let Some(token) = &context.session_token {
        form.push(("token", token.as_str()));
    }
    form.push(("platform", context.platform_key.as_str()));

    let resp = transport
        .post_form(API_URL, &[], &form, true)
        .await?
        .error_for_status()?;

    let envelope: Envelope = schema::decode(&resp.body)?;
    let stream: StreamResponse = schema::decode_value(envelope.tvplayer.response)?;
    Ok(stream.into())
}
