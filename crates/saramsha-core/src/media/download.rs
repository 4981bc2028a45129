//! Streaming download of direct media links.

use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::{AudioArtifact, Provenance, unique_file_name};
use crate::error::AcquisitionError;

/// Write granularity for downloads; the body is never held in memory whole.
pub const DOWNLOAD_CHUNK_BYTES: usize = 8 * 1024;

const FALLBACK_FILE_NAME: &str = "downloaded_file";

/// Last path segment of `url`, or a fixed fallback when the path is empty.
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Download `url` into `dir` under a collision-free name.
///
/// Non-2xx responses fail before anything is written. The file is owned by
/// the returned artifact from the moment it is created, so a broken body
/// stream or a dropped future leaves nothing behind.
pub async fn download_to_dir(
    client: &reqwest::Client,
    url: &Url,
    dir: &Path,
) -> Result<AudioArtifact, AcquisitionError> {
    let dest = dir.join(unique_file_name(&file_name_from_url(url)));

    let response = client.get(url.as_str()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AcquisitionError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let artifact = AudioArtifact::transient(&dest, Provenance::Downloaded);
    // Created inline so a dropped future cannot create it after the guard is gone
    let mut file = tokio::fs::File::from_std(std::fs::File::create(&dest)?);
    let bytes = write_body(response, &mut file).await?;
    drop(file);

    tracing::debug!(path = %dest.display(), bytes, "download finished");
    Ok(artifact)
}

async fn write_body(
    response: reqwest::Response,
    file: &mut tokio::fs::File,
) -> Result<u64, AcquisitionError> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(DOWNLOAD_CHUNK_BYTES) {
            file.write_all(piece).await?;
            written += piece.len() as u64;
        }
    }

    file.flush().await?;
    Ok(written)
}
