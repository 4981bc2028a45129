//! Error taxonomy for the pipeline.
//!
//! Acquisition and transcription failures abort a run; generation failures
//! never leave the summary strategy that hit them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not set")]
    MissingVar { name: &'static str },

    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Failure turning an input reference into a local audio file.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("download of {url} failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no extractable media at {url}")]
    NoMedia { url: String },

    #[error("media extractor failed: {0}")]
    ExtractorFailed(String),

    #[error("media extractor '{program}' is not installed or not in PATH")]
    ExtractorUnavailable { program: String },

    #[error("local file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("input is plain text, not media")]
    NotMedia,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`TranscriptionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionErrorKind {
    Upload,
    Submit,
    Poll,
    /// The service finished the job with status `error`
    Remote,
    Timeout,
    Cancelled,
    Io,
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("upload failed with HTTP {status}: {body}")]
    UploadRejected { status: u16, body: String },

    #[error("upload request failed: {0}")]
    Upload(#[source] reqwest::Error),

    #[error("job submission failed with HTTP {status}: {body}")]
    SubmitRejected { status: u16, body: String },

    #[error("job submission request failed: {0}")]
    Submit(#[source] reqwest::Error),

    #[error("polling job {job_id} failed: {reason}")]
    Poll { job_id: String, reason: String },

    #[error("transcription failed: {detail}")]
    Remote { job_id: String, detail: String },

    #[error("job {job_id} did not finish within {waited_secs}s")]
    Timeout { job_id: String, waited_secs: u64 },

    #[error("transcription cancelled")]
    Cancelled,

    #[error("cannot read audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscriptionError {
    pub fn kind(&self) -> TranscriptionErrorKind {
        match self {
            TranscriptionError::UploadRejected { .. } | TranscriptionError::Upload(_) => {
                TranscriptionErrorKind::Upload
            }
            TranscriptionError::SubmitRejected { .. } | TranscriptionError::Submit(_) => {
                TranscriptionErrorKind::Submit
            }
            TranscriptionError::Poll { .. } => TranscriptionErrorKind::Poll,
            TranscriptionError::Remote { .. } => TranscriptionErrorKind::Remote,
            TranscriptionError::Timeout { .. } => TranscriptionErrorKind::Timeout,
            TranscriptionError::Cancelled => TranscriptionErrorKind::Cancelled,
            TranscriptionError::Io(_) => TranscriptionErrorKind::Io,
        }
    }

    /// Error text reported by the service, for jobs that ended in `error`.
    pub fn remote_detail(&self) -> Option<&str> {
        match self {
            TranscriptionError::Remote { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Failure of a single text-generation call. Absorbed by the strategy.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: &'static str },

    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },
}

/// Which stage ended a run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Acquisition,
    Transcription(TranscriptionErrorKind),
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("media acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Acquisition(_) => ErrorKind::Acquisition,
            PipelineError::Transcription(e) => ErrorKind::Transcription(e.kind()),
            PipelineError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
