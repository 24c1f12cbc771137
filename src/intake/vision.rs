//! Boundary to the external vision-analysis service.
//!
//! The service is opaque, slow and occasionally wrong. It must answer with a
//! [`VisionReply`]: the identifier it read, the label fields, and its own
//! usage figures. Nothing is inferred from the shape of the answer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::scan::LabelFields;

/// Default model requested from the vision service.
pub const DEFAULT_VISION_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("vision transport error: {0}")]
    Transport(String),
    #[error("vision service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("vision reply could not be decoded: {0}")]
    Decode(String),
    #[error("vision service unavailable: {0}")]
    Unavailable(String),
}

/// One frame handed to the vision service.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub caller_id: String,
    /// Identifier the local decoder read; the reply must echo it.
    pub expected_uuid: Uuid,
    pub frame: Bytes,
}

/// Cost figures reported for one vision call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionUsage {
    pub total_tokens: u64,
    pub latency_ms: u64,
}

/// Structured answer of the vision service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionReply {
    #[serde(default)]
    pub identifier: Option<Uuid>,
    #[serde(default)]
    pub fields: LabelFields,
    #[serde(default)]
    pub usage: VisionUsage,
}

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, request: VisionRequest) -> Result<VisionReply, VisionError>;
}

/// Stand-in used when no vision endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVisionAnalyzer;

#[async_trait]
impl VisionAnalyzer for DisabledVisionAnalyzer {
    async fn analyze(&self, _request: VisionRequest) -> Result<VisionReply, VisionError> {
        Err(VisionError::Unavailable(
            "no vision endpoint configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    model: &'a str,
    expected_uuid: Uuid,
    image_base64: String,
}

/// JSON-over-HTTP vision client.
///
/// Posts `{model, expected_uuid, image_base64}` to the endpoint and decodes a
/// [`VisionReply`] from the response body.
#[derive(Debug, Clone)]
pub struct HttpVisionAnalyzer {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl HttpVisionAnalyzer {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, VisionError> {
        let endpoint =
            Url::parse(endpoint).map_err(|err| VisionError::Unavailable(err.to_string()))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| VisionError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("courier-intake/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl VisionAnalyzer for HttpVisionAnalyzer {
    async fn analyze(&self, request: VisionRequest) -> Result<VisionReply, VisionError> {
        let body = AnalyzeBody {
            model: &self.model,
            expected_uuid: request.expected_uuid,
            image_base64: STANDARD.encode(&request.frame),
        };

        let mut req = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let started = Instant::now();
        let resp = req
            .send()
            .await
            .map_err(|err| VisionError::Transport(err.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| VisionError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(VisionError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let mut reply = decode_reply(&bytes)?;
        if reply.usage.latency_ms == 0 {
            reply.usage.latency_ms = millis(started.elapsed());
        }
        debug!(
            caller_id = %request.caller_id,
            total_tokens = reply.usage.total_tokens,
            "vision reply decoded"
        );
        Ok(reply)
    }
}

pub(crate) fn decode_reply(bytes: &[u8]) -> Result<VisionReply, VisionError> {
    serde_json::from_slice(bytes).map_err(|err| VisionError::Decode(err.to_string()))
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
