//! Summarization endpoint client.
//!
//! One `POST {"text": ...}` exchange per call, no automatic retry — a
//! failed request is surfaced to the session controller, which decides
//! whether the user retries with a fresh call. Service failures (a
//! response arrived, but not a success) and transport failures (no usable
//! response at all) are distinct error variants so the controller can show
//! distinct inline messages.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{LumaError, Result};

/// Contract for summarization backends.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a condensed rendition of `text`.
    ///
    /// Callers must pass text that is non-empty after trimming; the
    /// session controller short-circuits empty input before reaching this
    /// seam.
    async fn summarize(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// HTTP client for the summarization relay.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SummaryClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LumaError::Other(anyhow::anyhow!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Build a client from the session configuration.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(
            config.summarize_endpoint.clone(),
            config.request_timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for SummaryClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        debug!(chars = text.len(), endpoint = %self.endpoint, "sending summarization request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SummarizeRequest { text })
            .send()
            .await
            .map_err(|e| LumaError::SummarizationTransport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LumaError::SummarizationService { status, body });
        }

        // A 2xx without the expected shape means nothing usable crossed
        // the boundary; classify it with the transport failures.
        let parsed: SummarizeResponse = response.json().await.map_err(|e| {
            LumaError::SummarizationTransport(format!("malformed summary response: {e}"))
        })?;
        Ok(parsed.summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_the_wire_shape() {
        let json = serde_json::to_value(SummarizeRequest { text: "long text" })
            .expect("serialize request");
        assert_eq!(json, serde_json::json!({ "text": "long text" }));
    }

    #[test]
    fn response_parses_the_wire_shape() {
        let parsed: SummarizeResponse =
            serde_json::from_str(r#"{"summary":"  short  "}"#).expect("parse response");
        assert_eq!(parsed.summary, "  short  ");
    }

    #[test]
    fn client_keeps_the_configured_endpoint() {
        let client =
            SummaryClient::new("http://127.0.0.1:3000/summarize-text", 30).expect("build client");
        assert_eq!(client.endpoint(), "http://127.0.0.1:3000/summarize-text");
    }

    #[test]
    fn from_config_uses_the_configured_endpoint() {
        let config = SessionConfig::default();
        let client = SummaryClient::from_config(&config).expect("build client");
        assert_eq!(client.endpoint(), config.summarize_endpoint);
    }
}
