use std::sync::Arc;
use std::time::Instant;

use super::generator::generator_for;
use super::strategies::{KeyFactsStrategy, NativeScriptStrategy, RomanizedDialectStrategy};
use super::{SummaryRecord, SummaryStrategy, truncate_chars};
use crate::config::{GenerationProvider, PipelineConfig};

/// Runs the three strategies against one transcript.
pub struct SummaryFanout {
    native_script: Arc<dyn SummaryStrategy>,
    romanized_dialect: Arc<dyn SummaryStrategy>,
    key_facts: Arc<dyn SummaryStrategy>,
    max_input_chars: usize,
}

impl SummaryFanout {
    pub fn new(
        native_script: Arc<dyn SummaryStrategy>,
        romanized_dialect: Arc<dyn SummaryStrategy>,
        key_facts: Arc<dyn SummaryStrategy>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            native_script,
            romanized_dialect,
            key_facts,
            max_input_chars,
        }
    }

    /// Wire strategies to providers. Native-script and key-facts use chat
    /// completions; romanized-dialect uses `config.romanized_provider`.
    pub fn from_config(config: &PipelineConfig, client: reqwest::Client) -> Self {
        let chat = generator_for(GenerationProvider::ChatCompletions, config, client.clone());
        let romanized = if config.romanized_provider == GenerationProvider::ChatCompletions {
            chat.clone()
        } else {
            generator_for(config.romanized_provider, config, client)
        };

        Self::new(
            Arc::new(NativeScriptStrategy::new(chat.clone())),
            Arc::new(RomanizedDialectStrategy::new(romanized)),
            Arc::new(
                KeyFactsStrategy::new(chat).with_max_input_chars(config.max_summary_input_chars),
            ),
            config.max_summary_input_chars,
        )
    }

    /// Produce all three summaries.
    ///
    /// An empty (or whitespace-only) transcript makes no remote calls and
    /// yields the all-empty record. A failing strategy leaves only its own
    /// slot empty.
    pub async fn summarize_all(&self, transcript: &str) -> SummaryRecord {
        if transcript.trim().is_empty() {
            return SummaryRecord::default();
        }

        let bounded = truncate_chars(transcript, self.max_input_chars);
        if bounded.len() < transcript.len() {
            tracing::debug!(
                max_chars = self.max_input_chars,
                "transcript truncated for summarization"
            );
        }

        let start = Instant::now();
        let (native_script, romanized_dialect, key_facts) = tokio::join!(
            self.native_script.summarize(bounded),
            self.romanized_dialect.summarize(bounded),
            self.key_facts.summarize(bounded),
        );

        let record = SummaryRecord {
            native_script,
            romanized_dialect,
            key_facts,
        };
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            kannada = !record.native_script.is_empty(),
            kanglish = !record.romanized_dialect.is_empty(),
            english = !record.key_facts.is_empty(),
            "summaries generated"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryKind;
    use crate::summary::generator::{ChatCompletionsGenerator, GeminiGenerator, TextGenerator};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Echoes a fixed reply and records its inputs
    struct Fake {
        kind: SummaryKind,
        reply: &'static str,
        inputs: Mutex<Vec<String>>,
    }

    impl Fake {
        fn new(kind: SummaryKind, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply,
                inputs: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.inputs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SummaryStrategy for Fake {
        fn kind(&self) -> SummaryKind {
            self.kind
        }

        async fn summarize(&self, transcript: &str) -> String {
            self.inputs.lock().unwrap().push(transcript.to_string());
            self.reply.to_string()
        }
    }

    fn fakes(replies: [&'static str; 3]) -> (Arc<Fake>, Arc<Fake>, Arc<Fake>) {
        (
            Fake::new(SummaryKind::NativeScript, replies[0]),
            Fake::new(SummaryKind::RomanizedDialect, replies[1]),
            Fake::new(SummaryKind::KeyFacts, replies[2]),
        )
    }

    fn fanout(parts: &(Arc<Fake>, Arc<Fake>, Arc<Fake>), max: usize) -> SummaryFanout {
        SummaryFanout::new(parts.0.clone(), parts.1.clone(), parts.2.clone(), max)
    }

    #[tokio::test]
    async fn test_empty_transcript_makes_no_calls() {
        let parts = fakes(["k", "kg", "e"]);
        let fanout = fanout(&parts, 5000);

        assert_eq!(fanout.summarize_all("").await, SummaryRecord::default());
        assert_eq!(fanout.summarize_all("  \n\t").await, SummaryRecord::default());
        assert_eq!(parts.0.calls() + parts.1.calls() + parts.2.calls(), 0);
    }

    #[tokio::test]
    async fn test_fills_every_slot() {
        let parts = fakes(["ಸಾರಾಂಶ", "saaraamsha", "- fact"]);
        let record = fanout(&parts, 5000).summarize_all("A short talk.").await;

        assert_eq!(record.native_script, "ಸಾರಾಂಶ");
        assert_eq!(record.romanized_dialect, "saaraamsha");
        assert_eq!(record.key_facts, "- fact");
    }

    #[tokio::test]
    async fn test_failed_slot_is_isolated() {
        // A failing strategy returns "" by contract
        let parts = fakes(["ಸಾರಾಂಶ", "", "- fact"]);
        let record = fanout(&parts, 5000).summarize_all("A short talk.").await;

        assert_eq!(record.native_script, "ಸಾರಾಂಶ");
        assert_eq!(record.romanized_dialect, "");
        assert_eq!(record.key_facts, "- fact");
    }

    #[tokio::test]
    async fn test_all_strategies_see_bounded_input() {
        let parts = fakes(["a", "b", "c"]);
        let transcript = "ಕ".repeat(12);
        fanout(&parts, 5).summarize_all(&transcript).await;

        for fake in [&parts.0, &parts.1, &parts.2] {
            let inputs = fake.inputs.lock().unwrap();
            assert_eq!(inputs.as_slice(), ["ಕಕಕಕಕ".to_string()]);
        }
    }

    #[tokio::test]
    async fn test_from_config_without_keys_yields_empty_slots() {
        // No generation keys: every provider fails before any request
        let config = PipelineConfig::new("aai");
        let fanout = SummaryFanout::from_config(&config, reqwest::Client::new());
        let record = fanout.summarize_all("Some transcript").await;
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_provider_outage_empties_only_its_slot() {
        let chat_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("written in Kannada script"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ಸೇತುವೆ 1998ರಲ್ಲಿ ತೆರೆಯಿತು." } }]
            })))
            .expect(1)
            .mount(&chat_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("key facts and figures"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "- Opened: 1998" } }]
            })))
            .expect(1)
            .mount(&chat_server)
            .await;

        let gemini_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .expect(1)
            .mount(&gemini_server)
            .await;

        let client = reqwest::Client::new();
        let chat: Arc<dyn TextGenerator> = Arc::new(
            ChatCompletionsGenerator::new(client.clone(), Some("or-key".into()))
                .with_base_url(&chat_server.uri()),
        );
        let gemini = Arc::new(
            GeminiGenerator::new(client, Some("gm-key".into())).with_base_url(&gemini_server.uri()),
        );
        let fanout = SummaryFanout::new(
            Arc::new(NativeScriptStrategy::new(chat.clone())),
            Arc::new(RomanizedDialectStrategy::new(gemini)),
            Arc::new(KeyFactsStrategy::new(chat)),
            5000,
        );

        let record = fanout.summarize_all("The bridge opened in 1998.").await;

        assert_eq!(record.native_script, "ಸೇತುವೆ 1998ರಲ್ಲಿ ತೆರೆಯಿತು.");
        assert_eq!(record.romanized_dialect, "");
        assert_eq!(record.key_facts, "- Opened: 1998");
    }
}
