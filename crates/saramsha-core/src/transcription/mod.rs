//! Remote transcription jobs.
//!
//! A job moves `uploading -> submitted -> {queued, processing} -> {completed | error}`
//! and is driven to a terminal state by polling. [`TranscriptionJob`] holds the
//! polled state; [`AssemblyAiClient`] is the HTTP implementation of
//! [`TranscriptionBackend`].

mod assemblyai;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::error::TranscriptionError;
use crate::media::AudioArtifact;

pub use assemblyai::AssemblyAiClient;

/// Status reported by the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages of a transcription call, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionStage {
    Uploading,
    Submitted,
    Polling(JobStatus),
}

impl fmt::Display for TranscriptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionStage::Uploading => f.write_str("uploading"),
            TranscriptionStage::Submitted => f.write_str("submitted"),
            TranscriptionStage::Polling(status) => write!(f, "{status}"),
        }
    }
}

/// One poll response
#[derive(Debug, Clone, Deserialize)]
pub struct JobUpdate {
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A submitted job and everything learned about it from polling.
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    id: String,
    remote_audio_url: String,
    status: JobStatus,
    result_text: Option<String>,
    error_detail: Option<String>,
    polls: u32,
}

impl TranscriptionJob {
    /// A freshly created job, queued until the first poll says otherwise.
    pub fn submitted(id: impl Into<String>, remote_audio_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            remote_audio_url: remote_audio_url.into(),
            status: JobStatus::Queued,
            result_text: None,
            error_detail: None,
            polls: 0,
        }
    }

    /// Record a poll response.
    ///
    /// Returns `false` and leaves the job untouched once it is terminal.
    pub fn apply(&mut self, update: JobUpdate) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.polls += 1;
        self.status = update.status;
        match update.status {
            JobStatus::Completed => self.result_text = Some(update.text.unwrap_or_default()),
            JobStatus::Error => {
                self.error_detail =
                    Some(update.error.unwrap_or_else(|| "unknown error".to_string()))
            }
            JobStatus::Queued | JobStatus::Processing => {}
        }
        true
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn remote_audio_url(&self) -> &str {
        &self.remote_audio_url
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of poll responses applied
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Final result, or `None` while the job is still running.
    pub fn outcome(&self) -> Option<Result<String, TranscriptionError>> {
        match self.status {
            JobStatus::Completed => Some(Ok(self.result_text.clone().unwrap_or_default())),
            JobStatus::Error => Some(Err(TranscriptionError::Remote {
                job_id: self.id.clone(),
                detail: self.error_detail.clone().unwrap_or_default(),
            })),
            JobStatus::Queued | JobStatus::Processing => None,
        }
    }
}

/// Turns a local audio file into plain text.
///
/// Implementations never delete the artifact; the caller owns cleanup.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &'static str;

    async fn transcribe(
        &self,
        artifact: &AudioArtifact,
        cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError>;
}
