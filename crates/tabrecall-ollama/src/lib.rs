// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local Ollama backend for the tabrecall AI pipeline.
//!
//! Implements the [`AiBackend`] trait against a local Ollama server:
//! summarization and classification via single-shot generation, ranking via
//! a JSON-array prompt. Also manages first-run model availability
//! (presence probe plus optional pull) so the daemon can flip the readiness
//! gate exactly once.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use tabrecall_core::{
    AdapterType, AiBackend, HealthStatus, ServiceAdapter, TabId, TabRecord, TabrecallError,
};
use tracing::{debug, info};

pub use client::OllamaClient;

/// AI backend speaking to a local Ollama server.
pub struct OllamaBackend {
    client: OllamaClient,
}

impl OllamaBackend {
    /// Creates a backend from the daemon configuration.
    pub fn new(config: &tabrecall_config::model::BackendConfig) -> Result<Self, TabrecallError> {
        let client = OllamaClient::new(&config.base_url, &config.model)?;
        Ok(Self { client })
    }

    /// Creates a backend around an existing client (tests).
    pub fn with_client(client: OllamaClient) -> Self {
        Self { client }
    }

    /// Verifies the model is installed, pulling it when `auto_pull` is set.
    ///
    /// Returns `BackendUnavailable` when the model is missing and pulling is
    /// disabled; callers leave the readiness gate closed and wait for an
    /// explicit ready event.
    pub async fn ensure_ready(&self, auto_pull: bool) -> Result<(), TabrecallError> {
        if self.client.has_model().await? {
            debug!(model = %self.client.model(), "model already installed");
            return Ok(());
        }

        if !auto_pull {
            return Err(TabrecallError::BackendUnavailable {
                message: format!(
                    "model {} is not installed (enable backend.auto_pull or pull it manually)",
                    self.client.model()
                ),
            });
        }

        self.client.pull_model().await?;
        info!(model = %self.client.model(), "model installed");
        Ok(())
    }
}

#[async_trait]
impl ServiceAdapter for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        match self.client.has_model().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded(format!(
                "model {} not installed",
                self.client.model()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        Ok(())
    }
}

#[async_trait]
impl AiBackend for OllamaBackend {
    async fn summarize(&self, text: &str) -> Result<String, TabrecallError> {
        let response = self.client.generate(&prompts::summarize_prompt(text)).await?;
        let summary = response.trim();
        if summary.is_empty() {
            return Err(TabrecallError::Backend {
                message: "model returned an empty summary".into(),
                source: None,
            });
        }
        Ok(summary.to_string())
    }

    async fn classify(&self, summary: &str) -> Result<String, TabrecallError> {
        let response = self.client.generate(&prompts::classify_prompt(summary)).await?;
        Ok(prompts::parse_label(&response))
    }

    async fn rank(
        &self,
        query: &str,
        records: &[TabRecord],
    ) -> Result<Vec<TabId>, TabrecallError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .generate(&prompts::rank_prompt(query, records))
            .await?;
        Ok(prompts::parse_rank_response(&response)
            .into_iter()
            .map(TabId)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_for(server: &MockServer, model: &str) -> OllamaBackend {
        OllamaBackend::with_client(OllamaClient::new(&server.uri(), model).unwrap())
    }

    fn generate_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": text}))
    }

    #[tokio::test]
    async fn summarize_trims_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(generate_response("  A neat summary.\n"))
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        assert_eq!(backend.summarize("text").await.unwrap(), "A neat summary.");
    }

    #[tokio::test]
    async fn empty_summary_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(generate_response("   "))
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        assert!(backend.summarize("text").await.is_err());
    }

    #[tokio::test]
    async fn classify_maps_to_known_category() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(generate_response("That would be Technology."))
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        assert_eq!(backend.classify("a summary").await.unwrap(), "Technology");
    }

    #[tokio::test]
    async fn rank_parses_id_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(generate_response("[2, 1]"))
            .mount(&server)
            .await;

        let records = vec![
            TabRecord::new(TabId(1), "https://a".into(), "A".into(), "x".into()),
            TabRecord::new(TabId(2), "https://b".into(), "B".into(), "y".into()),
        ];
        let backend = backend_for(&server, "m").await;
        assert_eq!(
            backend.rank("query", &records).await.unwrap(),
            vec![TabId(2), TabId(1)]
        );
    }

    #[tokio::test]
    async fn rank_empty_records_skips_request() {
        // No mock mounted: a request would fail the test.
        let server = MockServer::start().await;
        let backend = backend_for(&server, "m").await;
        assert!(backend.rank("query", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_ready_with_installed_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"models": [{"name": "m:latest"}]}),
            ))
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        backend.ensure_ready(false).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_ready_missing_model_without_pull_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        let err = backend.ensure_ready(false).await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn ensure_ready_pulls_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, "m").await;
        backend.ensure_ready(true).await.unwrap();
    }
}
