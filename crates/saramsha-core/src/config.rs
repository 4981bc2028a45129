use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TRANSCRIPTION_URL: &str = "https://api.assemblyai.com/v2";
pub const DEFAULT_SPEECH_MODEL: &str = "universal";
pub const DEFAULT_CHAT_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_MAX_SUMMARY_INPUT_CHARS: usize = 5000;
pub const DEFAULT_MEDIA_DIR: &str = "uploads";

pub const TRANSCRIPTION_API_KEY_VAR: &str = "ASSEMBLYAI_API_KEY";
pub const MEDIA_DIR_VAR: &str = "SARAMSHA_MEDIA_DIR";
pub const POLL_INTERVAL_VAR: &str = "SARAMSHA_POLL_INTERVAL_SECS";
pub const POLL_DEADLINE_VAR: &str = "SARAMSHA_POLL_DEADLINE_SECS";
pub const MAX_SUMMARY_INPUT_VAR: &str = "SARAMSHA_MAX_SUMMARY_INPUT_CHARS";
pub const ROMANIZED_PROVIDER_VAR: &str = "SARAMSHA_ROMANIZED_PROVIDER";

/// Available text-generation providers for summaries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationProvider {
    /// OpenAI-style `/chat/completions` (OpenRouter by default)
    #[default]
    ChatCompletions,
    /// Google Gemini `generateContent`
    Gemini,
}

impl GenerationProvider {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationProvider::ChatCompletions => "chat-completions",
            GenerationProvider::Gemini => "gemini",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            GenerationProvider::ChatCompletions => "OPENROUTER_API_KEY",
            GenerationProvider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// List all available providers
    pub fn all() -> &'static [GenerationProvider] {
        &[GenerationProvider::ChatCompletions, GenerationProvider::Gemini]
    }

    /// Human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            GenerationProvider::ChatCompletions => "OpenRouter",
            GenerationProvider::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat-completions" | "chat" | "openrouter" | "openai" => {
                Ok(GenerationProvider::ChatCompletions)
            }
            "gemini" | "google" => Ok(GenerationProvider::Gemini),
            _ => Err(format!(
                "Unknown generation provider: {}. Available: chat-completions, gemini",
                s
            )),
        }
    }
}

/// Everything the pipeline components need, passed in at construction.
///
/// Nothing in the crate reads keys or endpoints from globals; build one of
/// these (or call [`PipelineConfig::from_env`]) and hand it to
/// [`crate::Orchestrator::from_config`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub transcription_api_key: String,
    /// Key for the chat-completions provider
    pub generation_api_key_primary: Option<String>,
    /// Key for the Gemini provider
    pub generation_api_key_secondary: Option<String>,
    pub poll_interval: Duration,
    /// Upper bound on the whole polling phase. `None` polls until the job ends
    /// or the run is cancelled.
    pub poll_deadline: Option<Duration>,
    pub max_summary_input_chars: usize,
    /// Shared directory for uploads, downloads and extracted audio
    pub media_dir: PathBuf,
    pub transcription_base_url: String,
    pub speech_model: String,
    pub chat_base_url: String,
    pub chat_model: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Provider used for the romanized-dialect slot. The other two slots
    /// always use chat completions.
    pub romanized_provider: GenerationProvider,
}

impl PipelineConfig {
    /// Defaults for everything except the transcription key.
    pub fn new(transcription_api_key: impl Into<String>) -> Self {
        Self {
            transcription_api_key: transcription_api_key.into(),
            generation_api_key_primary: None,
            generation_api_key_secondary: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_deadline: None,
            max_summary_input_chars: DEFAULT_MAX_SUMMARY_INPUT_CHARS,
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            transcription_base_url: DEFAULT_TRANSCRIPTION_URL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            chat_base_url: DEFAULT_CHAT_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            romanized_provider: GenerationProvider::ChatCompletions,
        }
    }

    /// Load configuration from the process environment, after reading a
    /// `.env` file from the working directory if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let key = get(TRANSCRIPTION_API_KEY_VAR).ok_or(ConfigError::MissingVar {
            name: TRANSCRIPTION_API_KEY_VAR,
        })?;
        let mut config = Self::new(key.trim());

        config.generation_api_key_primary =
            get(GenerationProvider::ChatCompletions.api_key_env_var());
        config.generation_api_key_secondary = get(GenerationProvider::Gemini.api_key_env_var());

        if let Some(dir) = get(MEDIA_DIR_VAR) {
            config.media_dir = PathBuf::from(dir);
        }
        if let Some(secs) = get(POLL_INTERVAL_VAR) {
            config.poll_interval = Duration::from_secs(parse_number(POLL_INTERVAL_VAR, &secs)?);
        }
        if let Some(secs) = get(POLL_DEADLINE_VAR) {
            config.poll_deadline = Some(Duration::from_secs(parse_number(
                POLL_DEADLINE_VAR,
                &secs,
            )?));
        }
        if let Some(chars) = get(MAX_SUMMARY_INPUT_VAR) {
            config.max_summary_input_chars = parse_number(MAX_SUMMARY_INPUT_VAR, &chars)?;
        }

        config.romanized_provider = match get(ROMANIZED_PROVIDER_VAR) {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidVar {
                name: ROMANIZED_PROVIDER_VAR,
                reason,
            })?,
            // Prefer Gemini for the dialect slot when only its key is present
            None if config.generation_api_key_primary.is_none()
                && config.generation_api_key_secondary.is_some() =>
            {
                GenerationProvider::Gemini
            }
            None => GenerationProvider::ChatCompletions,
        };

        Ok(config)
    }

    /// API key for the given provider, if configured.
    pub fn generation_api_key(&self, provider: GenerationProvider) -> Option<&str> {
        match provider {
            GenerationProvider::ChatCompletions => self.generation_api_key_primary.as_deref(),
            GenerationProvider::Gemini => self.generation_api_key_secondary.as_deref(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        reason: format!("expected a non-negative number, got '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_transcription_key() {
        let err = PipelineConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                name: TRANSCRIPTION_API_KEY_VAR
            }
        ));
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[("ASSEMBLYAI_API_KEY", "aai")])).unwrap();
        assert_eq!(config.transcription_api_key, "aai");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.poll_deadline, None);
        assert_eq!(config.max_summary_input_chars, 5000);
        assert_eq!(config.media_dir, PathBuf::from("uploads"));
        assert_eq!(config.romanized_provider, GenerationProvider::ChatCompletions);
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("ASSEMBLYAI_API_KEY", "aai"),
            ("OPENROUTER_API_KEY", "or"),
            ("GEMINI_API_KEY", "gm"),
            ("SARAMSHA_POLL_INTERVAL_SECS", "1"),
            ("SARAMSHA_POLL_DEADLINE_SECS", "600"),
            ("SARAMSHA_MAX_SUMMARY_INPUT_CHARS", "100"),
            ("SARAMSHA_ROMANIZED_PROVIDER", "gemini"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.poll_deadline, Some(Duration::from_secs(600)));
        assert_eq!(config.max_summary_input_chars, 100);
        assert_eq!(config.romanized_provider, GenerationProvider::Gemini);
        assert_eq!(
            config.generation_api_key(GenerationProvider::ChatCompletions),
            Some("or")
        );
        assert_eq!(config.generation_api_key(GenerationProvider::Gemini), Some("gm"));
    }

    #[test]
    fn test_gemini_only_key_selects_gemini() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("ASSEMBLYAI_API_KEY", "aai"),
            ("GEMINI_API_KEY", "gm"),
        ]))
        .unwrap();
        assert_eq!(config.romanized_provider, GenerationProvider::Gemini);
    }

    #[test]
    fn test_invalid_number() {
        let err = PipelineConfig::from_lookup(lookup(&[
            ("ASSEMBLYAI_API_KEY", "aai"),
            ("SARAMSHA_POLL_INTERVAL_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "OpenRouter".parse::<GenerationProvider>().unwrap(),
            GenerationProvider::ChatCompletions
        );
        assert_eq!(
            "google".parse::<GenerationProvider>().unwrap(),
            GenerationProvider::Gemini
        );
        assert!("bard".parse::<GenerationProvider>().is_err());
        for provider in GenerationProvider::all() {
            assert_eq!(provider.to_string().parse::<GenerationProvider>().unwrap(), *provider);
        }
    }
}
