// Gemini `generateContent` client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CompletionRequest, LanguageModel, ModelTier, ResponseFormat};
use crate::error::ServiceError;
use crate::models::ServiceConfig;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    story_model: String,
    assist_model: String,
    thinking_budget: Option<u32>,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
    #[serde(default)]
    thought: bool,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .map(|p| p.text.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            story_model: config.story_model.clone(),
            assist_model: config.assist_model.clone(),
            thinking_budget: config.thinking_budget,
            client,
        })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Story => &self.story_model,
            ModelTier::Assist => &self.assist_model,
        }
    }

    fn build_body(&self, request: CompletionRequest) -> GenerateContentRequest {
        let mut config = GenerationConfig::default();
        match request.format {
            ResponseFormat::Text => {}
            ResponseFormat::Json => {
                config.response_mime_type = Some("application/json".to_string());
            }
            ResponseFormat::JsonSchema(schema) => {
                config.response_mime_type = Some("application/json".to_string());
                config.response_schema = Some(to_openapi_schema(schema));
            }
        }
        if request.tier == ModelTier::Story {
            config.thinking_config = self
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget });
        }

        let has_config = config.response_mime_type.is_some() || config.thinking_config.is_some();

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: has_config.then_some(config),
        }
    }
}

/// Gemini's schema dialect spells primitive types in upper case.
fn to_openapi_schema(schema: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match schema {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(t) if key == "type" => Value::String(t.to_uppercase()),
                        other => to_openapi_schema(other),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_openapi_schema).collect()),
        other => other,
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let model = self.model_for(request.tier).to_string();
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let body = self.build_body(request);

        tracing::debug!(%model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map_or(text, |envelope| envelope.error.message);
            return Err(ServiceError::transport(format!(
                "Gemini request failed with status {status}: {message}"
            )));
        }

        let result = response.json::<GenerateContentResponse>().await?;
        let text = result.text();
        if text.is_empty() {
            let reason = result
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("UNKNOWN");
            tracing::warn!(%model, finish_reason = reason, "Gemini returned no text");
        }
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models", self.base_url);

        self.client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    fn describe(&self) -> String {
        format!("gemini ({} / {})", self.story_model, self.assist_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::prompts;
    use crate::error::FailureKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> ServiceConfig {
        ServiceConfig {
            base_url,
            api_key: "test-key".to_string(),
            story_model: "story-model".to_string(),
            assist_model: "assist-model".to_string(),
            ..ServiceConfig::default()
        }
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(&ServiceConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_openapi_schema_uppercases_types() {
        let schema = to_openapi_schema(prompts::suggestions_schema());
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["titles"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["titles"]["items"]["type"], "STRING");
        assert_eq!(schema["required"][0], "titles");
    }

    #[test]
    fn test_text_body_has_no_generation_config() {
        let client = GeminiClient::new(&ServiceConfig::default()).unwrap();
        let body = client.build_body(CompletionRequest::text(ModelTier::Assist, "hi".to_string()));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_story_body_has_thinking_budget() {
        let client = GeminiClient::new(&ServiceConfig::default()).unwrap();
        let body = client.build_body(CompletionRequest {
            tier: ModelTier::Story,
            prompt: "p".to_string(),
            format: ResponseFormat::Json,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 4000);
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "pondering", "thought": true },
                    { "text": "Then the " },
                    { "text": "dragon spoke." }
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Then the dragon spoke.");
    }

    #[tokio::test]
    async fn test_complete_hits_tier_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/assist-model:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("More story.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&test_config(server.uri())).unwrap();
        let text = client
            .complete(CompletionRequest::text(ModelTier::Assist, "continue".to_string()))
            .await
            .unwrap();
        assert_eq!(text, "More story.");
    }

    #[tokio::test]
    async fn test_complete_sends_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/assist-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&test_config(server.uri())).unwrap();
        let result = client
            .complete(CompletionRequest {
                tier: ModelTier::Assist,
                prompt: "ideas".to_string(),
                format: ResponseFormat::JsonSchema(prompts::suggestions_schema()),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "API key not valid" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&test_config(server.uri())).unwrap();
        let err = client
            .complete(CompletionRequest::text(ModelTier::Story, "p".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_no_candidates_yields_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&test_config(server.uri())).unwrap();
        let text = client
            .complete(CompletionRequest::text(ModelTier::Assist, "p".to_string()))
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_health_check_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&test_config(server.uri())).unwrap();
        assert!(client.health_check().await);
    }

    #[test]
    fn test_describe() {
        let client = GeminiClient::new(&test_config("http://x".to_string())).unwrap();
        assert_eq!(client.describe(), "gemini (story-model / assist-model)");
    }
}
