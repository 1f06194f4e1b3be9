use std::env;
use std::time::Duration;

use crate::error::CoreError;
use crate::prompt::CoachPrompt;

/// Tekstgenerering (ekstern). Prod: `ChatCompletionsClient`, test: `StaticCoachProvider`.
pub trait CoachProvider {
    fn recommend(&self, prompt: &CoachPrompt) -> Result<String, CoreError>;
}

/// Returnerer alltid samme tekst
#[derive(Debug, Clone, Default)]
pub struct StaticCoachProvider {
    pub text: String,
}

impl StaticCoachProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl CoachProvider for StaticCoachProvider {
    fn recommend(&self, _prompt: &CoachPrompt) -> Result<String, CoreError> {
        Ok(self.text.clone())
    }
}

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-2-latest";

/// Klientkonfig. Sendes eksplisitt inn; ingen global klient.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CoachConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        }
    }

    /// XAI_API_KEY (påkrevd), COACH_BASE_URL og COACH_MODEL (valgfrie)
    pub fn from_env() -> Result<Self, CoreError> {
        let key = env::var("XAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CoreError::Config("XAI_API_KEY is not set".into()))?;
        let mut cfg = Self::new(key);
        if let Ok(url) = env::var("COACH_BASE_URL") {
            if !url.trim().is_empty() {
                cfg.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(model) = env::var("COACH_MODEL") {
            if !model.trim().is_empty() {
                cfg.model = model.trim().to_string();
            }
        }
        Ok(cfg)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
