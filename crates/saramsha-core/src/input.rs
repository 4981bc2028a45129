//! Classification of raw user input into an [`InputReference`].

use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Hosts whose pages are handed to the media extractor instead of being
/// downloaded directly. Subdomains (`www.`, `m.`, `music.`) match too.
const VIDEO_SITE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// Upload extensions accepted as audio
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];

/// Upload extensions accepted as video (the transcription service reads the
/// audio track itself)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// What the caller asked us to process. Immutable once classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputReference {
    /// A file already on local disk, owned by the caller
    LocalFile(PathBuf),
    /// A direct link to a media file
    GenericUrl(Url),
    /// A page on a video-sharing site
    VideoSiteUrl(Url),
    /// Text used verbatim as the transcript
    RawText(String),
}

impl InputReference {
    /// Classify a raw input string.
    ///
    /// With `treat_as_text` the input is always [`InputReference::RawText`].
    /// Otherwise `http`/`https` URLs are split by host, existing paths become
    /// local files, and anything else is text.
    pub fn classify(raw: &str, treat_as_text: bool) -> Self {
        if treat_as_text {
            return InputReference::RawText(raw.to_string());
        }

        let trimmed = raw.trim();
        if let Ok(url) = Url::parse(trimmed) {
            match url.scheme() {
                "http" | "https" if url.host_str().is_some() => {
                    return if is_video_site(&url) {
                        InputReference::VideoSiteUrl(url)
                    } else {
                        InputReference::GenericUrl(url)
                    };
                }
                _ => {}
            }
        }

        let path = Path::new(trimmed);
        if !trimmed.is_empty() && path.is_file() {
            return InputReference::LocalFile(path.to_path_buf());
        }

        InputReference::RawText(raw.to_string())
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            InputReference::LocalFile(_) => "local-file",
            InputReference::GenericUrl(_) => "url",
            InputReference::VideoSiteUrl(_) => "video-site",
            InputReference::RawText(_) => "text",
        }
    }
}

impl fmt::Display for InputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputReference::LocalFile(path) => write!(f, "{}", path.display()),
            InputReference::GenericUrl(url) | InputReference::VideoSiteUrl(url) => {
                write!(f, "{}", url)
            }
            InputReference::RawText(text) => write!(f, "<{} chars of text>", text.chars().count()),
        }
    }
}

/// Whether `url` points at a known video-sharing site.
///
/// Unparseable input is not a video-site URL.
pub fn is_video_site_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| is_video_site(&u))
        .unwrap_or(false)
}

fn is_video_site(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    VIDEO_SITE_HOSTS.iter().any(|known| {
        host == *known
            || host
                .strip_suffix(known)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Whether an uploaded file name carries an accepted audio or video extension.
pub fn is_allowed_media_file(file_name: &str) -> bool {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some(ext) => AUDIO_EXTENSIONS.contains(&ext) || VIDEO_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_site_hosts() {
        assert!(is_video_site_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_video_site_url("https://youtube.com/shorts/abc"));
        assert!(is_video_site_url("https://m.youtube.com/watch?v=abc"));
        assert!(is_video_site_url("https://music.youtube.com/watch?v=abc"));
        assert!(is_video_site_url("https://youtu.be/abc"));
        assert!(is_video_site_url("http://YOUTU.BE/abc"));
        assert!(is_video_site_url("https://www.youtube-nocookie.com/embed/abc"));
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        assert!(!is_video_site_url("https://notyoutube.com/watch?v=abc"));
        assert!(!is_video_site_url("https://youtube.com.evil.example/x"));
        assert!(!is_video_site_url("https://example.com/youtube.com/x.mp3"));
        assert!(!is_video_site_url("not a url"));
        assert!(!is_video_site_url(""));
    }

    #[test]
    fn test_classify_urls() {
        match InputReference::classify("https://youtu.be/abc", false) {
            InputReference::VideoSiteUrl(url) => assert_eq!(url.host_str(), Some("youtu.be")),
            other => panic!("unexpected {:?}", other),
        }
        match InputReference::classify(" https://cdn.example.com/talk.mp3 ", false) {
            InputReference::GenericUrl(url) => assert_eq!(url.path(), "/talk.mp3"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_local_file() {
        let file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        let raw = file.path().to_str().unwrap();
        assert_eq!(
            InputReference::classify(raw, false),
            InputReference::LocalFile(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(
            InputReference::classify("How are you?", false),
            InputReference::RawText("How are you?".into())
        );
        assert_eq!(
            InputReference::classify("ftp://example.com/a.mp3", false),
            InputReference::RawText("ftp://example.com/a.mp3".into())
        );
        // Forced text keeps URLs verbatim
        assert_eq!(
            InputReference::classify("https://youtu.be/abc", true),
            InputReference::RawText("https://youtu.be/abc".into())
        );
    }

    #[test]
    fn test_allowed_media_files() {
        assert!(is_allowed_media_file("talk.MP3"));
        assert!(is_allowed_media_file("clip.webm"));
        assert!(!is_allowed_media_file("notes.txt"));
        assert!(!is_allowed_media_file("README"));
    }
}
