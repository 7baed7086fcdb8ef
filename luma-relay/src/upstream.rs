//! Upstream model client.
//!
//! One non-streaming generate call per summarization request. The relay
//! never retries; the caller decides whether the user tries again.

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct ModelClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl ModelClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Ask the model for a condensed rendition of `text`.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!("Summarize the following text: {text}");
        let url = format!("{}/api/generate", self.base_url);
        debug!(%url, chars = text.len(), "forwarding summarization prompt");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: self.model.clone(),
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| anyhow!("model server unreachable: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(anyhow!("model server returned {status}: {body}"));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("malformed model response: {e}"))?;
        Ok(parsed.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_serializes_to_the_wire_shape() {
        let json = serde_json::to_value(GenerateRequest {
            model: "llama3.2".into(),
            prompt: "Summarize the following text: abc".into(),
            stream: false,
        })
        .expect("serialize request");
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["prompt"], "Summarize the following text: abc");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn generate_response_parses_and_ignores_extra_fields() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"response":" short ","done":true}"#).expect("parse response");
        assert_eq!(parsed.response, " short ");
    }

    #[test]
    fn client_trims_a_trailing_slash_from_the_base_url() {
        let client = ModelClient::new("http://localhost:11434/", "m", 5).expect("build client");
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}
