// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.
//!
//! Provides [`OllamaClient`] which handles request construction, transient
//! error retry, and model presence/pull management. Connection failures map
//! to `BackendUnavailable` so the pipeline can defer instead of failing.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tabrecall_core::TabrecallError;
use tracing::{debug, info, warn};

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body for a non-streaming `/api/generate` call.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response body for `/api/tags`.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

/// Request body for `/api/pull`.
#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// HTTP client for Ollama communication.
///
/// Manages connection pooling and retry logic for transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OllamaClient {
    /// Creates a new Ollama client for the given server and model.
    pub fn new(base_url: &str, model: &str) -> Result<Self, TabrecallError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| TabrecallError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: 1,
        })
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs a single non-streaming generation.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second
    /// delay. Connection failures become `BackendUnavailable`.
    pub async fn generate(&self, prompt: &str) -> Result<String, TabrecallError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generation after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(map_send_err)?;

            let status = response.status();
            debug!(status = %status, attempt, "generation response received");

            if status.is_success() {
                let parsed: GenerateResponse =
                    response.json().await.map_err(|e| TabrecallError::Backend {
                        message: format!("malformed generation response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(parsed.response);
            }

            let text = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient error, will retry");
                last_error = Some(TabrecallError::Backend {
                    message: format!("server returned {status}: {text}"),
                    source: None,
                });
                continue;
            }

            return Err(TabrecallError::Backend {
                message: format!("server returned {status}: {text}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| TabrecallError::Backend {
            message: "generation failed after retries".into(),
            source: None,
        }))
    }

    /// Returns true when the configured model is installed on the server.
    pub async fn has_model(&self) -> Result<bool, TabrecallError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TabrecallError::Backend {
                message: format!("model listing returned {status}: {text}"),
                source: None,
            });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| TabrecallError::Backend {
            message: format!("malformed model listing: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(tags.models.iter().any(|m| model_matches(&m.name, &self.model)))
    }

    /// Pulls the configured model. Blocks until the download completes.
    pub async fn pull_model(&self) -> Result<(), TabrecallError> {
        let url = format!("{}/api/pull", self.base_url);
        info!(model = %self.model, "pulling model, this may take a while");

        let response = self
            .client
            .post(&url)
            .json(&PullRequest {
                name: &self.model,
                stream: false,
            })
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TabrecallError::Backend {
                message: format!("model pull returned {status}: {text}"),
                source: None,
            });
        }

        info!(model = %self.model, "model pull complete");
        Ok(())
    }
}

/// A model name matches when identical, or when the installed name only
/// adds a tag the configured name omits (`llama3.2` matches `llama3.2:3b`).
fn model_matches(installed: &str, configured: &str) -> bool {
    installed == configured
        || (!configured.contains(':')
            && installed
                .strip_prefix(configured)
                .is_some_and(|rest| rest.starts_with(':')))
}

/// Transport-level failures mean the server is not running: recoverable.
fn map_send_err(e: reqwest::Error) -> TabrecallError {
    if e.is_connect() || e.is_timeout() {
        TabrecallError::BackendUnavailable {
            message: format!("cannot reach local model server: {e}"),
        }
    } else {
        TabrecallError::Backend {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn model_name_matching() {
        assert!(model_matches("llama3.2:3b", "llama3.2:3b"));
        assert!(model_matches("llama3.2:3b", "llama3.2"));
        assert!(!model_matches("llama3.2:3b", "llama3"));
        assert!(!model_matches("llama3.2", "llama3.2:3b"));
    }

    #[tokio::test]
    async fn generate_returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"model": "test-model", "stream": false})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "A summary."})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "test-model").unwrap();
        let out = client.generate("summarize this").await.unwrap();
        assert_eq!(out, "A summary.");
    }

    #[tokio::test]
    async fn generate_retries_transient_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "after retry"})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "test-model").unwrap();
        let out = client.generate("x").await.unwrap();
        assert_eq!(out, "after retry");
    }

    #[tokio::test]
    async fn generate_non_transient_error_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "missing-model").unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_unavailable() {
        // Nothing listens on this port.
        let client = OllamaClient::new("http://127.0.0.1:1", "test-model").unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(err.is_recoverable(), "connection failure should be recoverable: {err}");
    }

    #[tokio::test]
    async fn has_model_checks_installed_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "llama3.2:3b"}, {"name": "phi3:mini"}]
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.2:3b").unwrap();
        assert!(client.has_model().await.unwrap());

        let client = OllamaClient::new(&server.uri(), "qwen2.5:3b").unwrap();
        assert!(!client.has_model().await.unwrap());
    }

    #[tokio::test]
    async fn pull_model_posts_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_partial_json(serde_json::json!({"name": "llama3.2:3b"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.2:3b").unwrap();
        client.pull_model().await.unwrap();
    }
}
