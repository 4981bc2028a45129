//! Audio extraction from video-sharing sites via yt-dlp.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::warn;
use url::Url;

use crate::error::AcquisitionError;

/// Fetches the best audio stream behind a page URL and stores it locally.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &'static str;

    /// Extract audio from `url` into `dest_dir`, returning the final file path.
    async fn extract_audio(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, AcquisitionError>;
}

/// [`MediaExtractor`] backed by the `yt-dlp` command-line tool (which uses
/// FFmpeg for the transcode step).
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: String,
    audio_format: String,
    audio_quality: String,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

impl YtDlpExtractor {
    /// Use a specific executable instead of `yt-dlp` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Check that the executable can be started.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn output_template(dest_dir: &Path) -> PathBuf {
        // Title keeps names readable; the random part keeps them unique
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        dest_dir.join(format!("%(title).80B-{}.%(ext)s", &suffix[..12]))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_audio(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, AcquisitionError> {
        let work = WorkDir::create(dest_dir)?;
        let template = Self::output_template(work.path());
        tracing::debug!(%url, program = %self.program, "starting audio extraction");

        let output = Command::new(&self.program)
            .args([
                "--no-playlist",
                "--restrict-filenames",
                "--no-progress",
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                self.audio_format.as_str(),
                "--audio-quality",
                self.audio_quality.as_str(),
                "--no-simulate",
                "--print",
                "after_move:filepath",
                "-o",
            ])
            .arg(&template)
            .arg(url.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AcquisitionError::ExtractorUnavailable {
                        program: self.program.clone(),
                    }
                } else {
                    AcquisitionError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquisitionError::ExtractorFailed(last_error_line(&stderr)));
        }

        let no_media = || AcquisitionError::NoMedia {
            url: url.to_string(),
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        let extracted = printed_path(&stdout)
            .filter(|path| path.is_file())
            .ok_or_else(no_media)?;
        let file_name = extracted.file_name().ok_or_else(no_media)?;

        let dest = dest_dir.join(file_name);
        std::fs::rename(&extracted, &dest)?;
        Ok(dest)
    }
}

/// Scratch directory for one extraction run.
///
/// yt-dlp leaves `.part` and pre-transcode files next to its output; the
/// whole directory goes away on drop, including when the run is cancelled.
struct WorkDir(PathBuf);

impl WorkDir {
    fn create(parent: &Path) -> std::io::Result<Self> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let path = parent.join(format!(".extract-{}", &suffix[..12]));
        std::fs::create_dir_all(&path)?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.0.display(), error = %e, "failed to remove extraction directory"),
        }
    }
}

/// The final file path printed by `--print after_move:filepath`.
fn printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with("ERROR"))
        .or_else(|| stderr.lines().map(str::trim).rfind(|line| !line.is_empty()))
        .unwrap_or("yt-dlp exited with an error")
        .to_string()
}
