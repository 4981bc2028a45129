use anyhow::{Context, Result};
use clap::Args;
use saramsha_core::input::is_allowed_media_file;
use saramsha_core::{ErrorKind, InputReference, Orchestrator, PipelineResult, SummaryKind};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::app::{self, Overrides};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Audio/video file, media URL, video-site link, or text
    pub input: String,

    /// Treat the input as text to summarize
    #[arg(long)]
    pub text: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Give up on transcription after this many seconds of polling
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory for downloaded and extracted media
    #[arg(long, value_name = "DIR")]
    pub media_dir: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let input = InputReference::classify(&args.input, args.text);
    match &input {
        InputReference::VideoSiteUrl(_) => app::ensure_yt_dlp_installed().await?,
        InputReference::LocalFile(path) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !is_allowed_media_file(name) {
                anyhow::bail!(
                    "Unsupported file type: {}\nSupported: mp3, wav, m4a, mp4, mov, avi, mkv, webm",
                    path.display()
                );
            }
        }
        InputReference::GenericUrl(_) | InputReference::RawText(_) => {}
    }

    let config = app::load_pipeline_config(Overrides {
        media_dir: args.media_dir,
        timeout_secs: args.timeout,
    })?;
    let orchestrator =
        Orchestrator::from_config(&config).context("Failed to initialize HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = match orchestrator.try_run(&input, &cancel).await {
        Ok(result) => result,
        Err(e) if e.kind() == ErrorKind::Cancelled || cancel.is_cancelled() => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(e) => return Err(e).context("Pipeline failed"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_sections(&result);
    }
    Ok(())
}

fn print_sections(result: &PipelineResult) {
    if !result.audio_file_name.is_empty() {
        println!("Audio: {}\n", result.audio_file_name);
    }
    print_section("Transcript", &result.transcript_text);
    for kind in SummaryKind::all() {
        print_section(kind.display_name(), result.summaries.get(*kind));
    }
}

fn print_section(title: &str, body: &str) {
    println!("{title}");
    println!("{}", "-".repeat(title.chars().count()));
    if body.is_empty() {
        println!("(none)\n");
    } else {
        println!("{body}\n");
    }
}
