// core/src/coach_api.rs
use log::{debug, info};
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::coach::{CoachConfig, CoachProvider};
use crate::error::CoreError;
use crate::prompt::CoachPrompt;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-kompatibel chat-completions klient – enkel blocking-versjon (ureq)
pub struct ChatCompletionsClient {
    agent: Agent,
    config: CoachConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: CoachConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }
}

impl CoachProvider for ChatCompletionsClient {
    fn recommend(&self, prompt: &CoachPrompt) -> Result<String, CoreError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = self.config.completions_url();
        debug!("[coach] POST {} model={}", url, self.config.model);

        let resp = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, r) => CoreError::Coach(format!(
                    "HTTP {}: {}",
                    code,
                    r.into_string().unwrap_or_default()
                )),
                other => CoreError::Coach(other.to_string()),
            })?;

        let parsed: ChatResponse = resp
            .into_json()
            .map_err(|e| CoreError::Coach(format!("invalid response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CoreError::Coach("response contained no text".into()))?;

        info!("[coach] received {} chars", text.len());
        Ok(text)
    }
}
