//! Localized summaries of a transcript.
//!
//! Three strategies each make one text-generation call:
//!
//! | Slot | Strategy | Output |
//! |------|----------|--------|
//! | `kannada` | [`NativeScriptStrategy`] | Kannada summary in Kannada script |
//! | `kanglish` | [`RomanizedDialectStrategy`] | Kannada written in Roman letters |
//! | `english` | [`KeyFactsStrategy`] | Terse English key facts |
//!
//! A strategy never fails: any generation error is logged and the slot stays
//! empty. [`SummaryFanout`] runs all three and always returns a complete
//! [`SummaryRecord`].

mod fanout;
mod generator;
mod strategies;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GenerationError;

pub use fanout::SummaryFanout;
pub use generator::{
    ChatCompletionsGenerator, GeminiGenerator, GenerationRequest, TextGenerator, generator_for,
};
pub use strategies::{
    KeyFactsStrategy, NativeScriptStrategy, RomanizedDialectStrategy, first_content_line,
};

/// The three summary slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKind {
    NativeScript,
    RomanizedDialect,
    KeyFacts,
}

impl SummaryKind {
    /// Slot name used in serialized output
    pub fn slot(&self) -> &'static str {
        match self {
            SummaryKind::NativeScript => "kannada",
            SummaryKind::RomanizedDialect => "kanglish",
            SummaryKind::KeyFacts => "english",
        }
    }

    pub fn all() -> &'static [SummaryKind] {
        &[
            SummaryKind::NativeScript,
            SummaryKind::RomanizedDialect,
            SummaryKind::KeyFacts,
        ]
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            SummaryKind::NativeScript => "Kannada",
            SummaryKind::RomanizedDialect => "Kanglish",
            SummaryKind::KeyFacts => "English key facts",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

/// Exactly three summaries. An empty string means "not produced".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "kannada")]
    pub native_script: String,
    #[serde(rename = "kanglish")]
    pub romanized_dialect: String,
    #[serde(rename = "english")]
    pub key_facts: String,
}

impl SummaryRecord {
    pub fn get(&self, kind: SummaryKind) -> &str {
        match kind {
            SummaryKind::NativeScript => &self.native_script,
            SummaryKind::RomanizedDialect => &self.romanized_dialect,
            SummaryKind::KeyFacts => &self.key_facts,
        }
    }

    pub fn set(&mut self, kind: SummaryKind, value: String) {
        match kind {
            SummaryKind::NativeScript => self.native_script = value,
            SummaryKind::RomanizedDialect => self.romanized_dialect = value,
            SummaryKind::KeyFacts => self.key_facts = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        SummaryKind::all().iter().all(|k| self.get(*k).is_empty())
    }
}

/// Produces one summary string from a transcript. Infallible by contract.
#[async_trait]
pub trait SummaryStrategy: Send + Sync {
    fn kind(&self) -> SummaryKind;

    /// Summarize `transcript`, returning an empty string on any failure.
    async fn summarize(&self, transcript: &str) -> String;
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Collapse a generation result into a slot value, logging failures.
fn settle(kind: SummaryKind, result: Result<String, GenerationError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(slot = kind.slot(), error = %e, "summary generation failed");
            String::new()
        }
    }
}
