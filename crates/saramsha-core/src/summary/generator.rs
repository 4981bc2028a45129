//! Text-generation providers.
//!
//! - **Chat completions** - OpenAI wire format (OpenRouter by default),
//!   bearer auth, `choices[0].message.content`
//! - **Gemini** - `models/{model}:generateContent`, key in the query string,
//!   `candidates[0].content.parts[*].text`
//!
//! Strategies only see [`TextGenerator`], so providers are swappable per slot.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{
    DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL,
    GenerationProvider, PipelineConfig,
};
use crate::error::GenerationError;

/// One generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider identifier used in errors and logs
    fn provider(&self) -> &'static str;

    /// Run one completion and return its trimmed, non-empty text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Build the generator for `provider` from configuration.
pub fn generator_for(
    provider: GenerationProvider,
    config: &PipelineConfig,
    client: reqwest::Client,
) -> Arc<dyn TextGenerator> {
    let api_key = config.generation_api_key(provider).map(str::to_string);
    match provider {
        GenerationProvider::ChatCompletions => Arc::new(
            ChatCompletionsGenerator::new(client, api_key)
                .with_base_url(&config.chat_base_url)
                .with_model(&config.chat_model),
        ),
        GenerationProvider::Gemini => Arc::new(
            GeminiGenerator::new(client, api_key)
                .with_base_url(&config.gemini_base_url)
                .with_model(&config.gemini_model),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` provider
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsGenerator {
    const PROVIDER: &'static str = "chat-completions";

    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_CHAT_URL.to_string(),
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    fn provider(&self) -> &'static str {
        Self::PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey {
            provider: Self::PROVIDER,
        })?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await
            .map_err(|source| GenerationError::Request {
                provider: Self::PROVIDER,
                source,
            })?;

        let body = read_body(Self::PROVIDER, response).await?;
        let chat: ChatResponse = parse(Self::PROVIDER, &body)?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(Self::PROVIDER, content)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// Google Gemini `generateContent` provider
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiGenerator {
    const PROVIDER: &'static str = "gemini";

    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn provider(&self) -> &'static str {
        Self::PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey {
            provider: Self::PROVIDER,
        })?;

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        });
        if let Some(system) = &request.system_prompt {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, api_key
            ))
            .json(&body)
            .send()
            .await
            .map_err(|source| GenerationError::Request {
                provider: Self::PROVIDER,
                // The URL carries the key; keep it out of logs
                source: source.without_url(),
            })?;

        let body = read_body(Self::PROVIDER, response).await?;
        let gemini: GeminiResponse = parse(Self::PROVIDER, &body)?;
        let text: String = gemini
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        non_empty(Self::PROVIDER, text)
    }
}

async fn read_body(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| GenerationError::Request { provider, source })?;
    if !status.is_success() {
        return Err(GenerationError::HttpStatus {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn parse<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, GenerationError> {
    serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
        provider,
        reason: e.to_string(),
    })
}

fn non_empty(provider: &'static str, text: String) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyCompletion { provider });
    }
    Ok(trimmed.to_string())
}
