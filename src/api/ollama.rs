// Ollama API client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CompletionRequest, LanguageModel, ModelTier, ResponseFormat};
use crate::error::ServiceError;
use crate::models::ServiceConfig;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    story_model: String,
    assist_model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// `"json"` or a JSON Schema object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

impl OllamaClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            story_model: config.story_model.clone(),
            assist_model: config.assist_model.clone(),
            client,
        })
    }

    fn build_request(&self, request: CompletionRequest) -> GenerateRequest {
        let model = match request.tier {
            ModelTier::Story => self.story_model.clone(),
            ModelTier::Assist => self.assist_model.clone(),
        };
        let format = match request.format {
            ResponseFormat::Text => None,
            ResponseFormat::Json => Some(serde_json::Value::String("json".to_string())),
            ResponseFormat::JsonSchema(schema) => Some(schema),
        };

        GenerateRequest {
            model,
            prompt: request.prompt,
            format,
            stream: false,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = self.build_request(request);

        tracing::debug!(model = %request.model, "Sending generate request");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::transport(format!(
                "Ollama request failed with status {status}: {text}"
            )));
        }

        let result = response.json::<GenerateResponse>().await?;
        if !result.done {
            tracing::warn!(model = %request.model, "Ollama response not marked done");
        }

        Ok(result.response)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    fn describe(&self) -> String {
        format!("ollama ({} / {})", self.story_model, self.assist_model)
    }
}
