use analysis_core::{AnalysisError, NarrativeGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the text-generation service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("LLM_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for an Ollama-style `/api/generate` endpoint. Constructed
/// explicitly and passed to the caller that needs it; there is no
/// process-wide instance.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(LlmConfig::default())
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, AnalysisError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        tracing::debug!(model = self.config.model.as_str(), "requesting narrative generation");
        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "text generation service returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(body.response.trim().to_string())
    }
}

#[async_trait]
impl NarrativeGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        self.generate_text(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_response_parses_and_trims() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"response": "  analysis text \n", "done": true}"#).unwrap();
        assert_eq!(body.response.trim(), "analysis text");
    }

    #[test]
    fn request_serializes_expected_shape() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "hello",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
    }
}
