// Generation service: provider clients and the three story calls

pub mod gemini;
pub mod ollama;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{GeneratedStory, GenerationOptions, Genre, Provider, ServiceConfig, SuggestionBundle};

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Which configured model a request should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Slower, stronger model used for whole-story generation.
    Story,
    /// Fast model used for continuations and suggestions.
    Assist,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    Json,
    JsonSchema(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub tier: ModelTier,
    pub prompt: String,
    pub format: ResponseFormat,
}

impl CompletionRequest {
    pub fn text(tier: ModelTier, prompt: String) -> Self {
        Self {
            tier,
            prompt,
            format: ResponseFormat::Text,
        }
    }
}

/// A hosted model that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;

    async fn health_check(&self) -> bool;

    /// Short human-readable description, e.g. `gemini (gemini-3-pro-preview)`.
    fn describe(&self) -> String;
}

pub fn create_model(config: &ServiceConfig) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.provider {
        Provider::Gemini => Arc::new(GeminiClient::new(config)?),
        Provider::Ollama => Arc::new(OllamaClient::new(config)?),
    };
    Ok(model)
}

/// The three calls the studio makes against a [`LanguageModel`].
#[derive(Clone)]
pub struct StoryService {
    model: Arc<dyn LanguageModel>,
}

impl StoryService {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn describe(&self) -> String {
        self.model.describe()
    }

    pub async fn health_check(&self) -> bool {
        self.model.health_check().await
    }

    pub async fn generate_story(
        &self,
        options: &GenerationOptions,
    ) -> Result<GeneratedStory, ServiceError> {
        let request = CompletionRequest {
            tier: ModelTier::Story,
            prompt: prompts::story_prompt(options),
            format: ResponseFormat::Json,
        };
        let text = self.model.complete(request).await?;
        parse_json_payload(&text)
    }

    /// Returns the continuation exactly as the model wrote it; an empty string is a valid answer.
    pub async fn expand_story(
        &self,
        content: &str,
        instruction: &str,
    ) -> Result<String, ServiceError> {
        let request =
            CompletionRequest::text(ModelTier::Assist, prompts::expand_prompt(content, instruction));
        self.model.complete(request).await
    }

    pub async fn suggestions(
        &self,
        prompt: &str,
        genre: Genre,
    ) -> Result<SuggestionBundle, ServiceError> {
        let request = CompletionRequest {
            tier: ModelTier::Assist,
            prompt: prompts::suggestions_prompt(prompt, genre),
            format: ResponseFormat::JsonSchema(prompts::suggestions_schema()),
        };
        let text = self.model.complete(request).await?;
        parse_json_payload(&text)
    }
}

/// Parse a JSON payload from model output, tolerating a surrounding code fence.
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, ServiceError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(ServiceError::schema("empty response"));
    }
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::StoryLength;
    use mockall::predicate::function;

    fn service_returning(text: &'static str) -> StoryService {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(move |_| Ok(text.to_string()));
        StoryService::new(Arc::new(model))
    }

    #[test]
    fn test_parse_plain_json() {
        let story: GeneratedStory =
            parse_json_payload(r#"{"title":"T","content":"C","summary":"S"}"#).unwrap();
        assert_eq!(story.title, "T");
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "```json\n{\"title\":\"T\",\"content\":\"C\",\"summary\":\"S\"}\n```";
        let story: GeneratedStory = parse_json_payload(text).unwrap();
        assert_eq!(story.summary, "S");
    }

    #[test]
    fn test_parse_missing_field_is_schema_failure() {
        let err = parse_json_payload::<GeneratedStory>(r#"{"title":"T","content":"C"}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Schema);
    }

    #[test]
    fn test_parse_wrong_type_is_schema_failure() {
        let err =
            parse_json_payload::<GeneratedStory>(r#"{"title":1,"content":"C","summary":"S"}"#)
                .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Schema);
    }

    #[test]
    fn test_parse_empty_is_schema_failure() {
        let err = parse_json_payload::<SuggestionBundle>("  ").unwrap_err();
        assert_eq!(err, ServiceError::schema("empty response"));
    }

    #[tokio::test]
    async fn test_generate_story_uses_story_tier_and_json() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .with(function(|req: &CompletionRequest| {
                req.tier == ModelTier::Story
                    && req.format == ResponseFormat::Json
                    && req.prompt.contains("A dragon wakes")
            }))
            .times(1)
            .returning(|_| {
                Ok(r#"{"title":"The Last Ember","content":"Smoke.","summary":"A dragon."}"#
                    .to_string())
            });
        let service = StoryService::new(Arc::new(model));

        let options = GenerationOptions {
            prompt: "A dragon wakes".to_string(),
            genre: Genre::Fantasy,
            length: StoryLength::Short,
            ..GenerationOptions::default()
        };
        let story = service.generate_story(&options).await.unwrap();
        assert_eq!(story.title, "The Last Ember");
    }

    #[tokio::test]
    async fn test_expand_story_accepts_empty_text() {
        let service = service_returning("");
        let text = service.expand_story("Once.", "go on").await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_expand_story_returns_text_verbatim() {
        let service = service_returning("  Then the dragon spoke.\n\n- a list\n");
        let text = service.expand_story("Once.", "go on").await.unwrap();
        assert_eq!(text, "  Then the dragon spoke.\n\n- a list\n");
    }

    #[tokio::test]
    async fn test_suggestions_sends_schema() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .with(function(|req: &CompletionRequest| {
                req.tier == ModelTier::Assist
                    && matches!(req.format, ResponseFormat::JsonSchema(_))
            }))
            .times(1)
            .returning(|_| {
                Ok(r#"{"titles":["A"],"characterNames":["Bo"],"plotIdeas":["C"]}"#.to_string())
            });
        let service = StoryService::new(Arc::new(model));

        let bundle = service.suggestions("a long enough prompt", Genre::Horror).await.unwrap();
        assert_eq!(bundle.character_names, vec!["Bo".to_string()]);
    }

    #[tokio::test]
    async fn test_suggestions_missing_array_fails() {
        let service = service_returning(r#"{"titles":["A"],"characterNames":["Bo"]}"#);
        let err = service.suggestions("prompt", Genre::Horror).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Schema);
    }

    #[tokio::test]
    async fn test_transport_failure_passes_through() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Err(ServiceError::transport("connection refused")));
        let service = StoryService::new(Arc::new(model));

        let err = service
            .generate_story(&GenerationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }
}
