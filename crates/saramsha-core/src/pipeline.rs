//! Input to transcript to summaries.
//!
//! ```text
//! InputReference ─► MediaAcquirer ─► TranscriptionBackend ─► SummaryFanout
//!   (RawText skips straight to summaries)
//! ```
//!
//! [`Orchestrator::run`] always returns a renderable [`PipelineResult`]; any
//! acquisition or transcription failure degrades to the all-empty result.
//! [`Orchestrator::try_run`] exposes the typed error instead.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::http;
use crate::input::InputReference;
use crate::media::{MediaAcquirer, YtDlpExtractor};
use crate::summary::{SummaryFanout, SummaryRecord};
use crate::transcription::{AssemblyAiClient, TranscriptionBackend};

/// Everything a caller renders for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub transcript_text: String,
    /// Artifact file name, empty for text input and failed runs
    pub audio_file_name: String,
    pub summaries: SummaryRecord,
}

pub struct Orchestrator {
    acquirer: MediaAcquirer,
    transcriber: Arc<dyn TranscriptionBackend>,
    fanout: SummaryFanout,
}

impl Orchestrator {
    pub fn new(
        acquirer: MediaAcquirer,
        transcriber: Arc<dyn TranscriptionBackend>,
        fanout: SummaryFanout,
    ) -> Self {
        Self {
            acquirer,
            transcriber,
            fanout,
        }
    }

    /// Production wiring: shared HTTP client, yt-dlp, AssemblyAI and the
    /// configured generation providers.
    pub fn from_config(config: &PipelineConfig) -> reqwest::Result<Self> {
        let client = http::shared_client()?.clone();
        Ok(Self::new(
            MediaAcquirer::new(
                &config.media_dir,
                client.clone(),
                Arc::new(YtDlpExtractor::default()),
            ),
            Arc::new(AssemblyAiClient::from_config(config, client.clone())),
            SummaryFanout::from_config(config, client),
        ))
    }

    /// Run the pipeline, degrading any failure to the all-empty result.
    pub async fn run(&self, input: &InputReference, cancel: &CancellationToken) -> PipelineResult {
        match self.try_run(input, cancel).await {
            Ok(result) => result,
            Err(e) => {
                error!(input = %input, kind = ?e.kind(), error = %e, "pipeline failed");
                PipelineResult::default()
            }
        }
    }

    /// Run the pipeline, returning the first acquisition or transcription
    /// error.
    ///
    /// Owned artifacts are removed as soon as transcription reaches a terminal
    /// state, on success and failure alike.
    pub async fn try_run(
        &self,
        input: &InputReference,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        info!(input = %input, kind = input.kind(), "pipeline started");

        let (transcript_text, audio_file_name) = match input {
            InputReference::RawText(text) => (text.clone(), String::new()),
            media => {
                let artifact = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                    acquired = self.acquirer.acquire(media) => acquired?,
                };
                let audio_file_name = artifact.file_name().to_string();

                let transcribed = self.transcriber.transcribe(&artifact, cancel).await;
                artifact.cleanup();
                (transcribed?, audio_file_name)
            }
        };

        let summaries = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            record = self.fanout.summarize_all(&transcript_text) => record,
        };

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            transcript_chars = transcript_text.chars().count(),
            "pipeline finished"
        );
        Ok(PipelineResult {
            transcript_text,
            audio_file_name,
            summaries,
        })
    }
}
