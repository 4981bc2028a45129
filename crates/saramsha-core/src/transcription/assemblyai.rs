//! AssemblyAI-style transcription client.
//!
//! Three endpoints, relative to the base URL:
//! - `POST /upload` (raw bytes) -> `{upload_url}`
//! - `POST /transcript` `{audio_url, speech_model}` -> `{id}`
//! - `GET /transcript/{id}` -> `{status, text | error}`
//!
//! Upload and submission failures are fatal. Polling repeats at a fixed
//! interval until the job is terminal, the optional deadline passes, or the
//! cancellation token fires.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{JobUpdate, TranscriptionBackend, TranscriptionJob, TranscriptionStage};
use crate::config::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SPEECH_MODEL, DEFAULT_TRANSCRIPTION_URL, PipelineConfig,
};
use crate::error::TranscriptionError;
use crate::media::AudioArtifact;

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Transcription client for the AssemblyAI v2 API (or anything speaking it)
#[derive(Debug, Clone)]
pub struct AssemblyAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    speech_model: String,
    poll_interval: Duration,
    poll_deadline: Option<Duration>,
}

impl AssemblyAiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_TRANSCRIPTION_URL.to_string(),
            api_key: api_key.into(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_deadline: None,
        }
    }

    pub fn from_config(config: &PipelineConfig, client: reqwest::Client) -> Self {
        Self::new(client, config.transcription_api_key.clone())
            .with_base_url(&config.transcription_base_url)
            .with_speech_model(&config.speech_model)
            .with_poll_interval(config.poll_interval)
            .with_poll_deadline(config.poll_deadline)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_speech_model(mut self, speech_model: &str) -> Self {
        self.speech_model = speech_model.to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.poll_deadline = deadline;
        self
    }

    /// Stream the file to the service and return the hosted audio URL.
    pub async fn upload(&self, path: &Path) -> Result<String, TranscriptionError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await
            .map_err(TranscriptionError::Upload)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let upload: UploadResponse = response.json().await.map_err(TranscriptionError::Upload)?;
        Ok(upload.upload_url)
    }

    /// Create a transcription job for previously uploaded audio.
    pub async fn submit(&self, audio_url: &str) -> Result<TranscriptionJob, TranscriptionError> {
        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .json(&serde_json::json!({
                "audio_url": audio_url,
                "speech_model": self.speech_model,
            }))
            .send()
            .await
            .map_err(TranscriptionError::Submit)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::SubmitRejected {
                status: status.as_u16(),
                body,
            });
        }

        let submitted: SubmitResponse = response.json().await.map_err(TranscriptionError::Submit)?;
        Ok(TranscriptionJob::submitted(submitted.id, audio_url))
    }

    /// Fetch the current state of a job once.
    pub async fn poll_once(&self, job_id: &str) -> Result<JobUpdate, TranscriptionError> {
        let poll_error = |reason: String| TranscriptionError::Poll {
            job_id: job_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(format!("{}/transcript/{}", self.base_url, job_id))
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await
            .map_err(|e| poll_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(poll_error(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        response
            .json::<JobUpdate>()
            .await
            .map_err(|e| poll_error(e.to_string()))
    }

    /// Poll `job` until it reaches a terminal state.
    ///
    /// Polls immediately, then once per interval. The deadline, if any,
    /// counts from the first poll.
    pub async fn wait_for_completion(
        &self,
        job: &mut TranscriptionJob,
        cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError> {
        let started = Instant::now();
        let deadline = self.poll_deadline.map(|d| started + d);

        loop {
            let update = bounded(cancel, deadline, job.id(), started, self.poll_once(job.id())).await?;
            job.apply(update);
            report_stage(TranscriptionStage::Polling(job.status()), job.id());

            if let Some(outcome) = job.outcome() {
                if outcome.is_ok() {
                    info!(
                        job_id = job.id(),
                        polls = job.polls(),
                        elapsed_secs = started.elapsed().as_secs(),
                        "transcription completed"
                    );
                }
                return outcome;
            }

            let interval = self.poll_interval;
            bounded(cancel, deadline, job.id(), started, async move {
                tokio::time::sleep(interval).await;
                Ok(())
            })
            .await?;
        }
    }
}

#[async_trait]
impl TranscriptionBackend for AssemblyAiClient {
    fn name(&self) -> &'static str {
        "assemblyai"
    }

    async fn transcribe(
        &self,
        artifact: &AudioArtifact,
        cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError> {
        let started = Instant::now();
        report_stage(TranscriptionStage::Uploading, "");
        let audio_url = bounded(cancel, None, "", started, self.upload(artifact.path())).await?;
        info!(
            file = artifact.file_name(),
            elapsed_secs = started.elapsed().as_secs(),
            "upload completed"
        );

        let mut job = bounded(cancel, None, "", started, self.submit(&audio_url)).await?;
        report_stage(TranscriptionStage::Submitted, job.id());

        self.wait_for_completion(&mut job, cancel).await
    }
}

fn report_stage(stage: TranscriptionStage, job_id: &str) {
    debug!(%stage, job_id, "transcription stage");
}

/// Run `fut` unless the token fires or the deadline passes first.
async fn bounded<T, F>(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    job_id: &str,
    started: Instant,
    fut: F,
) -> Result<T, TranscriptionError>
where
    F: Future<Output = Result<T, TranscriptionError>>,
{
    let expiry = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TranscriptionError::Cancelled),
        _ = expiry => Err(TranscriptionError::Timeout {
            job_id: job_id.to_string(),
            waited_secs: started.elapsed().as_secs(),
        }),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscriptionErrorKind;
    use crate::media::{AudioArtifact, Provenance};
    use crate::transcription::JobStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Replies with each template in turn, repeating the last one
    struct Sequence(Mutex<VecDeque<ResponseTemplate>>);

    impl Sequence {
        fn new(templates: Vec<ResponseTemplate>) -> Self {
            Self(Mutex::new(templates.into()))
        }
    }

    impl Respond for Sequence {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let mut queue = self.0.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }

    fn status(status: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "job-1", "status": status }))
    }

    fn client(server: &MockServer) -> AssemblyAiClient {
        AssemblyAiClient::new(reqwest::Client::new(), "test-key")
            .with_base_url(&server.uri())
            .with_poll_interval(Duration::from_millis(10))
    }

    async fn mount_upload_and_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("authorization", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "upload_url": "https://cdn.assemblyai.test/upload/abc"
            })))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/transcript"))
            .and(body_json(serde_json::json!({
                "audio_url": "https://cdn.assemblyai.test/upload/abc",
                "speech_model": "universal"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "status": "queued"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn audio_file(dir: &Path) -> AudioArtifact {
        let path = dir.join("clip.mp3");
        std::fs::write(&path, vec![1u8; 4096]).unwrap();
        AudioArtifact::transient(path, Provenance::Downloaded)
    }

    async fn poll_count(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "GET")
            .count()
    }

    #[tokio::test]
    async fn test_transcribe_completes_after_three_polls() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/transcript/job-1"))
            .respond_with(Sequence::new(vec![
                status("queued"),
                status("processing"),
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "job-1",
                    "status": "completed",
                    "text": "Hello from Bengaluru."
                })),
            ]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = audio_file(dir.path());
        let text = client(&server)
            .transcribe(&artifact, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "Hello from Bengaluru.");
        assert_eq!(poll_count(&server).await, 3);
        // The client never deletes the artifact itself
        assert!(artifact.path().exists());
    }

    #[tokio::test]
    async fn test_remote_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_upload_and_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/transcript/job-1"))
            .respond_with(Sequence::new(vec![
                status("processing"),
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "job-1",
                    "status": "error",
                    "error": "Audio duration is too short."
                })),
            ]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server)
            .transcribe(&audio_file(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), TranscriptionErrorKind::Remote);
        assert_eq!(err.remote_detail(), Some("Audio duration is too short."));
        assert_eq!(poll_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_upload_rejected_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/transcript"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server)
            .transcribe(&audio_file(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TranscriptionError::UploadRejected { status: 401, ref body } if body == "Invalid API key"
        ));
    }

    #[tokio::test]
    async fn test_submit_rejected_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "upload_url": "https://cdn.assemblyai.test/upload/abc"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/transcript"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad audio_url"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server)
            .transcribe(&audio_file(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), TranscriptionErrorKind::Submit);
        assert_eq!(poll_count(&server).await, 0);
    }

    #[tokio::test]
    async fn test_poll_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/job-9"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut job = TranscriptionJob::submitted("job-9", "u");
        let err = client(&server)
            .wait_for_completion(&mut job, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), TranscriptionErrorKind::Poll);
        assert_eq!(job.polls(), 0);
    }

    #[tokio::test]
    async fn test_deadline_stops_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/job-1"))
            .respond_with(status("processing"))
            .mount(&server)
            .await;

        let mut job = TranscriptionJob::submitted("job-1", "u");
        let err = client(&server)
            .with_poll_deadline(Some(Duration::from_millis(80)))
            .wait_for_completion(&mut job, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), TranscriptionErrorKind::Timeout);
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.polls() >= 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/job-1"))
            .respond_with(status("queued"))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut job = TranscriptionJob::submitted("job-1", "u");
        let err = client(&server)
            .wait_for_completion(&mut job, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), TranscriptionErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let dir = tempfile::tempdir().unwrap();
        let err = client(&server)
            .transcribe(&audio_file(dir.path()), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Cancelled));
    }
}
