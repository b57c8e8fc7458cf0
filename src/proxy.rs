//! Upstream RAG backend client — bounded chat and health calls.
//!
//! The gateway never interprets backend answers; successful responses are
//! relayed verbatim (status + JSON body) and failures become the fixed
//! error envelopes the widget knows how to display.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::UpstreamError;

/// Request body accepted by `POST /chat` and forwarded upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Value>,
    #[serde(default)]
    pub message_generation: bool,
}

fn default_max_context_chunks() -> u32 {
    5
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_context_chunks: default_max_context_chunks(),
            model: None,
            session_id: None,
            selections: None,
            message_generation: false,
        }
    }
}

/// An upstream reply relayed verbatim: original status code + JSON body.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

/// HTTP client for the external RAG backend.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base: String,
    chat_timeout: Duration,
    health_timeout: Duration,
}

impl Upstream {
    pub fn new(
        base: impl Into<String>,
        chat_timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
            chat_timeout,
            health_timeout,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Forward a query to the backend chat endpoint.
    pub async fn chat(&self, request: &ChatRequest) -> Result<UpstreamReply, UpstreamError> {
        let resp = self
            .client
            .post(format!("{}/chat", self.base))
            .timeout(self.chat_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e, self.chat_timeout))?;
        Self::relay(resp).await
    }

    /// Check the backend liveness endpoint.
    pub async fn health(&self) -> Result<UpstreamReply, UpstreamError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e, self.health_timeout))?;
        Self::relay(resp).await
    }

    async fn relay(resp: reqwest::Response) -> Result<UpstreamReply, UpstreamError> {
        let status = resp.status().as_u16();
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::InvalidBody(e.to_string()))?;
        Ok(UpstreamReply { status, body })
    }

    fn request_error(&self, error: reqwest::Error, timeout: Duration) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Request(error.to_string())
        }
    }

    /// The HTTP 500 envelope served when the chat proxy fails.
    pub fn chat_error_body(error: &UpstreamError) -> Value {
        json!({
            "answer": format!("Error contacting backend: {error}"),
            "citations": [],
            "retrieval_metadata": { "error": error.to_string() },
        })
    }

    /// The HTTP 500 envelope served when the health proxy fails.
    pub fn health_error_body(error: &UpstreamError) -> Value {
        json!({ "status": "error", "detail": error.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults_match_the_wire_contract() {
        let request: ChatRequest = serde_json::from_str(r#"{"query": "hi"}"#).unwrap();
        assert_eq!(request.query, "hi");
        assert_eq!(request.max_context_chunks, 5);
        assert!(request.model.is_none());
        assert!(!request.message_generation);

        // Absent optionals are not forwarded.
        let forwarded = serde_json::to_value(&request).unwrap();
        assert!(forwarded.get("model").is_none());
        assert!(forwarded.get("session_id").is_none());
        assert_eq!(forwarded["max_context_chunks"], 5);
    }

    #[test]
    fn chat_error_body_shape() {
        let error = UpstreamError::Request("connection refused".to_string());
        let body = Upstream::chat_error_body(&error);
        assert!(
            body["answer"]
                .as_str()
                .unwrap()
                .starts_with("Error contacting backend:")
        );
        assert!(body["citations"].as_array().unwrap().is_empty());
        assert!(
            body["retrieval_metadata"]["error"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }

    #[test]
    fn health_error_body_shape() {
        let error = UpstreamError::Timeout(Duration::from_secs(15));
        let body = Upstream::health_error_body(&error);
        assert_eq!(body["status"], "error");
        assert!(body["detail"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        // Port 1 on loopback is never listening in the test environment.
        let upstream = Upstream::new(
            "http://127.0.0.1:1",
            Duration::from_secs(2),
            Duration::from_secs(2),
        );
        let error = upstream.health().await.unwrap_err();
        assert!(matches!(
            error,
            UpstreamError::Request(_) | UpstreamError::Timeout(_)
        ));
    }
}
