//! Media acquisition: every non-text input ends up as one local audio file.
//!
//! - Local uploads are used in place and stay on disk.
//! - Direct URLs are streamed into the media directory.
//! - Video-site pages go through a [`MediaExtractor`] (yt-dlp by default).
//!
//! Downloaded and extracted files are owned by the returned
//! [`AudioArtifact`] and removed when it is dropped.

mod download;
mod extract;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AcquisitionError;
use crate::input::InputReference;

pub use download::{DOWNLOAD_CHUNK_BYTES, download_to_dir, file_name_from_url};
pub use extract::{MediaExtractor, YtDlpExtractor};

/// Where an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Uploaded,
    Downloaded,
    Extracted,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Uploaded => write!(f, "uploaded"),
            Provenance::Downloaded => write!(f, "downloaded"),
            Provenance::Extracted => write!(f, "extracted"),
        }
    }
}

/// A local audio file ready for transcription.
///
/// Owned artifacts delete their file exactly once: on [`AudioArtifact::cleanup`]
/// or when dropped, whichever comes first. Uploaded artifacts belong to the
/// caller and are never deleted.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    file_name: String,
    provenance: Provenance,
    owned: bool,
}

impl AudioArtifact {
    /// Wrap a caller-managed file.
    pub fn uploaded(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), Provenance::Uploaded, false)
    }

    /// Take ownership of a file the pipeline created.
    pub fn transient(path: impl Into<PathBuf>, provenance: Provenance) -> Self {
        Self::new(path.into(), provenance, true)
    }

    fn new(path: PathBuf, provenance: Provenance, owned: bool) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            provenance,
            owned,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether the pipeline deletes this file when done with it
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Release the artifact now, deleting the file if owned.
    pub fn cleanup(self) {
        drop(self);
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary audio file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temporary audio file"),
        }
    }
}

/// Collision-free name for a file stored in the shared media directory.
///
/// Keeps a sanitized form of the original stem and extension and adds a
/// random suffix, so concurrent runs never overwrite each other.
pub fn unique_file_name(original: &str) -> String {
    let original = Path::new(original);
    let stem = original
        .file_stem()
        .map(|s| sanitize(&s.to_string_lossy()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "media".to_string());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..12];

    match original.extension().map(|e| sanitize(&e.to_string_lossy())) {
        Some(ext) if !ext.is_empty() => format!("{stem}-{suffix}.{}", ext.to_lowercase()),
        _ => format!("{stem}-{suffix}"),
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

/// Turns an [`InputReference`] into an [`AudioArtifact`].
pub struct MediaAcquirer {
    media_dir: PathBuf,
    client: reqwest::Client,
    extractor: Arc<dyn MediaExtractor>,
}

impl MediaAcquirer {
    pub fn new(
        media_dir: impl Into<PathBuf>,
        client: reqwest::Client,
        extractor: Arc<dyn MediaExtractor>,
    ) -> Self {
        Self {
            media_dir: media_dir.into(),
            client,
            extractor,
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Produce a local audio file for `input`.
    ///
    /// Text inputs are rejected with [`AcquisitionError::NotMedia`].
    pub async fn acquire(&self, input: &InputReference) -> Result<AudioArtifact, AcquisitionError> {
        match input {
            InputReference::LocalFile(path) => {
                if !path.is_file() {
                    return Err(AcquisitionError::MissingFile(path.clone()));
                }
                debug!(path = %path.display(), "using uploaded file");
                Ok(AudioArtifact::uploaded(path.clone()))
            }
            InputReference::GenericUrl(url) => {
                tokio::fs::create_dir_all(&self.media_dir).await?;
                let artifact = download_to_dir(&self.client, url, &self.media_dir).await?;
                info!(%url, path = %artifact.path().display(), "downloaded media");
                Ok(artifact)
            }
            InputReference::VideoSiteUrl(url) => {
                tokio::fs::create_dir_all(&self.media_dir).await?;
                let path = self.extractor.extract_audio(url, &self.media_dir).await?;
                info!(
                    %url,
                    extractor = self.extractor.name(),
                    path = %path.display(),
                    "extracted audio"
                );
                Ok(AudioArtifact::transient(path, Provenance::Extracted))
            }
            InputReference::RawText(_) => Err(AcquisitionError::NotMedia),
        }
    }
}
