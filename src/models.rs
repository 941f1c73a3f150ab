use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const TONES: [&str; 7] = [
    "Dark",
    "Whimsical",
    "Serious",
    "Humorous",
    "Melancholic",
    "Inspirational",
    "Sarcastic",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Genre {
    #[default]
    Fantasy,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Mystery,
    Romance,
    Horror,
    Thriller,
    #[serde(rename = "Historical Fiction")]
    Historical,
    Adventure,
}

impl Genre {
    pub const ALL: [Self; 8] = [
        Self::Fantasy,
        Self::SciFi,
        Self::Mystery,
        Self::Romance,
        Self::Horror,
        Self::Thriller,
        Self::Historical,
        Self::Adventure,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fantasy => "Fantasy",
            Self::SciFi => "Sci-Fi",
            Self::Mystery => "Mystery",
            Self::Romance => "Romance",
            Self::Horror => "Horror",
            Self::Thriller => "Thriller",
            Self::Historical => "Historical Fiction",
            Self::Adventure => "Adventure",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|g| *g == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StoryLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl StoryLength {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Short => "Short (~300 words)",
            Self::Medium => "Medium (~800 words)",
            Self::Long => "Long (~1500 words)",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Short => Self::Medium,
            Self::Medium => Self::Long,
            Self::Long => Self::Short,
        }
    }
}

impl fmt::Display for StoryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters for a single story generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub prompt: String,
    pub genre: Genre,
    pub length: StoryLength,
    pub include_twist: bool,
    pub heavy_dialogue: bool,
    pub tone: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            genre: Genre::default(),
            length: StoryLength::default(),
            include_twist: false,
            heavy_dialogue: false,
            tone: "Serious".to_string(),
        }
    }
}

impl GenerationOptions {
    /// Advance the tone to the next entry of [`TONES`]; unknown tones restart the cycle.
    pub fn cycle_tone(&mut self) {
        let next = TONES
            .iter()
            .position(|t| *t == self.tone)
            .map_or(0, |idx| (idx + 1) % TONES.len());
        self.tone = TONES[next].to_string();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub genre: Genre,
    pub content: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Story {
    pub fn new(generated: GeneratedStory, genre: Genre) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: generated.title,
            genre,
            content: generated.content,
            summary: generated.summary,
            created_at: Utc::now(),
        }
    }
}

/// Payload the service returns for a story generation call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBundle {
    pub titles: Vec<String>,
    pub character_names: Vec<String>,
    pub plot_ideas: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Ollama,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub coordinator: CoordinatorConfig,
    pub export: ExportConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: String,
    pub story_model: String,
    pub assist_model: String,
    pub thinking_budget: Option<u32>,
    pub request_timeout: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            story_model: "gemini-3-pro-preview".to_string(),
            assist_model: "gemini-3-flash-preview".to_string(),
            thinking_budget: Some(4000),
            request_timeout: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub debounce_ms: u64,
    pub suggestion_min_chars: usize,
    pub call_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1500,
            suggestion_min_chars: 15,
            call_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub accent_color: String,
    pub border_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent_color: "magenta".to_string(),
            border_color: "cyan".to_string(),
        }
    }
}
