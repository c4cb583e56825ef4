// factory-sim-providers/src/http.rs
// ============================================================================
// Module: HTTP Model Gateway
// Description: ModelGateway implementation backed by an OpenAI-compatible
//              JSON-mode chat completion endpoint.
// Purpose: The one place outbound model I/O actually happens.
// Dependencies: factory-sim-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpModelGateway`] posts a prompt and an embedded JSON schema to a
//! chat completion endpoint and returns the parsed `content` field as a
//! [`serde_json::Value`]. It never retries; a caller that wants retries
//! wraps it. Every failure mode collapses to one of
//! [`factory_sim_core::GatewayError`]'s three variants, matching the
//! contract in §4.1.

use async_trait::async_trait;
use factory_sim_core::GatewayError;
use factory_sim_core::ModelGateway;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

/// Configuration for [`HttpModelGateway`].
#[derive(Debug, Clone)]
pub struct HttpModelGatewayConfig {
    /// Base URL of the chat completion endpoint (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Bearer token sent as `Authorization: Bearer <api_key>`.
    pub api_key: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Per-request timeout.
    pub timeout: std::time::Duration,
}

/// Chat-completion-backed [`ModelGateway`].
pub struct HttpModelGateway {
    /// Gateway configuration.
    config: HttpModelGatewayConfig,
    /// Reusable HTTP client.
    client: reqwest::Client,
}

impl HttpModelGateway {
    /// Builds a gateway from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: HttpModelGatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| GatewayError::Transport(format!("client build failed: {error}")))?;
        Ok(Self { config, client })
    }
}

/// Shape of a chat completion response this gateway understands.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    /// Candidate completions; the gateway reads only the first.
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// One chat completion choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// The message returned by the model.
    message: ChatMessage,
}

/// A chat message's content field.
#[derive(Debug, Deserialize)]
struct ChatMessage {
    /// Raw text content; expected to be a JSON document as a string.
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn call_json(&self, prompt: &str, schema: &Value) -> Result<Value, GatewayError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "response_format": { "type": "json_schema", "json_schema": { "name": "stage_output", "schema": schema } },
            "messages": [
                { "role": "system", "content": "Respond with JSON only, matching the provided schema exactly." },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GatewayError::Transport(format!("unexpected status {status}")));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|error| GatewayError::Parse(error.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Refused("empty completion".to_owned()))?;

        if content.trim().is_empty() {
            return Err(GatewayError::Refused("empty completion".to_owned()));
        }

        serde_json::from_str(&content).map_err(|error| GatewayError::Parse(error.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;

    #[test]
    fn config_builds_a_client() {
        let gateway = HttpModelGateway::new(HttpModelGatewayConfig {
            base_url: "https://example.invalid/v1".to_owned(),
            api_key: "test-key".to_owned(),
            model: "gpt-test".to_owned(),
            timeout: std::time::Duration::from_millis(500),
        });
        assert!(gateway.is_ok());
    }
}
