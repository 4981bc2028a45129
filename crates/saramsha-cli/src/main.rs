mod app;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "saramsha",
    about = "Transcribe media or text and summarize it in Kannada, Kanglish and English",
    version
)]
struct Cli {
    /// Debug logging for saramsha components
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline on a file, URL or text
    Run(commands::run::RunArgs),

    /// Show how an input would be interpreted
    Classify {
        /// File path, URL or text
        input: String,

        /// Treat the input as text even if it looks like a path or URL
        #[arg(long)]
        text: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    saramsha_core::logging::init(cli.verbose);

    match cli.command {
        Command::Run(args) => commands::run::run(args).await,
        Command::Classify { input, text } => commands::classify::run(&input, text),
    }
}
