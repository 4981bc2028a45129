use anyhow::Result;
use saramsha_core::config::TRANSCRIPTION_API_KEY_VAR;
use saramsha_core::{ConfigError, GenerationProvider, PipelineConfig, YtDlpExtractor};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line overrides applied on top of the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub media_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

pub fn load_pipeline_config(overrides: Overrides) -> Result<PipelineConfig> {
    let mut config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVar { name }) => {
            eprintln!("Error: {name} is not set.");
            if name == TRANSCRIPTION_API_KEY_VAR {
                eprintln!("\nsaramsha needs an AssemblyAI key to transcribe media.");
            }
            eprintln!("Set it in your shell or in a .env file:");
            eprintln!("  export {name}=YOUR_KEY\n");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(dir) = overrides.media_dir {
        config.media_dir = dir;
    }
    if let Some(secs) = overrides.timeout_secs {
        config.poll_deadline = Some(Duration::from_secs(secs));
    }

    for provider in GenerationProvider::all() {
        if config.generation_api_key(*provider).is_none() {
            tracing::debug!(
                provider = provider.as_str(),
                env_var = provider.api_key_env_var(),
                "no API key configured"
            );
        }
    }
    if GenerationProvider::all()
        .iter()
        .all(|p| config.generation_api_key(*p).is_none())
    {
        eprintln!(
            "Warning: neither {} nor {} is set; summaries will be empty.",
            GenerationProvider::ChatCompletions.api_key_env_var(),
            GenerationProvider::Gemini.api_key_env_var()
        );
    }

    Ok(config)
}

pub async fn ensure_yt_dlp_installed() -> Result<()> {
    if !YtDlpExtractor::default().is_available().await {
        eprintln!("Error: yt-dlp is not installed or not in PATH.");
        eprintln!("\nsaramsha uses yt-dlp (with FFmpeg) to pull audio from video sites.");
        eprintln!("Please install it:");
        eprintln!("  - pip: pip install yt-dlp");
        eprintln!("  - macOS: brew install yt-dlp ffmpeg");
        eprintln!("  - Ubuntu/Debian: sudo apt install yt-dlp ffmpeg");
        eprintln!("  - Or visit: https://github.com/yt-dlp/yt-dlp#installation\n");
        std::process::exit(1);
    }
    Ok(())
}
