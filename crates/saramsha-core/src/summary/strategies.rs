//! The three summary strategies.

use async_trait::async_trait;
use std::sync::Arc;

use super::generator::{GenerationRequest, TextGenerator};
use super::{SummaryKind, SummaryStrategy, settle, truncate_chars};
use crate::config::DEFAULT_MAX_SUMMARY_INPUT_CHARS;
use crate::error::GenerationError;

const NATIVE_SCRIPT_SYSTEM_PROMPT: &str = "You are a Kannada language expert. \
Summarize the text in Kannada, written in Kannada script (ಕನ್ನಡ). \
Keep it concise and cover the main points. \
Do not transliterate into Roman letters and do not add an English translation.";

const ROMANIZED_DIALECT_SYSTEM_PROMPT: &str = "You are a Kannada language expert. \
Convert English text to Kanglish (Kannada written in Roman/English script, not Kannada script).

Key principles:
1. Translate meaning to Kannada, then write phonetically in English letters
2. Keep the casual rhythm of spoken Kannada sentences
3. Use common Kanglish words where they exist
4. Add the inherent 'a' vowel after consonants as per Kannada phonetics

Standard examples:
- \"Hello\" -> \"namaskara\"
- \"How are you?\" -> \"hegiddira?\"
- \"What is your name?\" -> \"nimma hesaru enu?\"
- \"I am fine\" -> \"naanu chennagi iddene\"
- \"Thank you\" -> \"dhanyavadagalu\"

Provide only the Kanglish conversion, nothing else.";

const KEY_FACTS_SYSTEM_PROMPT: &str = "Extract and list the key facts and figures from the text.";

/// Lines the generator sometimes appends after the answer
const ANNOTATION_MARKERS: &[&str] = &["Note:", "Explanation:"];

/// First non-empty line of a completion that is not an annotation.
///
/// Returns an empty string when every line is blank or an annotation.
pub fn first_content_line(completion: &str) -> &str {
    completion
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty() && !ANNOTATION_MARKERS.iter().any(|m| line.starts_with(m))
        })
        .unwrap_or("")
}

/// Kannada-script summary
pub struct NativeScriptStrategy {
    generator: Arc<dyn TextGenerator>,
}

impl NativeScriptStrategy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn request(transcript: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: Some(NATIVE_SCRIPT_SYSTEM_PROMPT.to_string()),
            prompt: format!("Text to summarize:\n\n{transcript}"),
            temperature: 0.5,
            max_tokens: 600,
        }
    }
}

#[async_trait]
impl SummaryStrategy for NativeScriptStrategy {
    fn kind(&self) -> SummaryKind {
        SummaryKind::NativeScript
    }

    async fn summarize(&self, transcript: &str) -> String {
        let result = self.generator.generate(&Self::request(transcript)).await;
        settle(self.kind(), result)
    }
}

/// Kannada in Roman letters ("Kanglish"), trailing commentary stripped
pub struct RomanizedDialectStrategy {
    generator: Arc<dyn TextGenerator>,
}

impl RomanizedDialectStrategy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn request(transcript: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: Some(ROMANIZED_DIALECT_SYSTEM_PROMPT.to_string()),
            prompt: format!("Convert this English text to natural Kanglish: \"{transcript}\""),
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    /// An all-annotation completion counts as empty
    fn content_line(provider: &'static str, completion: &str) -> Result<String, GenerationError> {
        match first_content_line(completion) {
            "" => Err(GenerationError::EmptyCompletion { provider }),
            line => Ok(line.to_string()),
        }
    }
}

#[async_trait]
impl SummaryStrategy for RomanizedDialectStrategy {
    fn kind(&self) -> SummaryKind {
        SummaryKind::RomanizedDialect
    }

    async fn summarize(&self, transcript: &str) -> String {
        let result = self
            .generator
            .generate(&Self::request(transcript))
            .await
            .and_then(|completion| Self::content_line(self.generator.provider(), &completion));
        settle(self.kind(), result)
    }
}

/// Terse English key facts from a bounded prefix of the transcript
pub struct KeyFactsStrategy {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl KeyFactsStrategy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_input_chars: DEFAULT_MAX_SUMMARY_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    fn request(&self, transcript: &str) -> GenerationRequest {
        let text = truncate_chars(transcript, self.max_input_chars);
        GenerationRequest {
            system_prompt: Some(KEY_FACTS_SYSTEM_PROMPT.to_string()),
            prompt: format!("Text to summarize:\n\n{text}"),
            temperature: 0.7,
            max_tokens: 300,
        }
    }
}

#[async_trait]
impl SummaryStrategy for KeyFactsStrategy {
    fn kind(&self) -> SummaryKind {
        SummaryKind::KeyFacts
    }

    async fn summarize(&self, transcript: &str) -> String {
        let result = self.generator.generate(&self.request(transcript)).await;
        settle(self.kind(), result)
    }
}
