//! Reelsmith CLI: plan, render, and caption short-form videos.
//!
//! Usage:
//!   reelsmith render <REQUEST>        Render a request to a vertical video
//!   reelsmith plan <REQUEST>          Print the composed timeline
//!   reelsmith captions <TRANSCRIPT>   Write a subtitle file
//!   reelsmith check                   Check the ffmpeg toolchain

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use reelsmith_captions::SubtitleFormat;
use reelsmith_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsmith",
    about = "Assemble short-form vertical videos from planned scenes",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reelsmith/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Ass,
    Srt,
}

impl From<FormatArg> for SubtitleFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Ass => SubtitleFormat::Ass,
            FormatArg::Srt => SubtitleFormat::Srt,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a request and wait for the job to finish
    Render {
        /// Path to the request JSON
        request: PathBuf,

        /// Directory for the finished video
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Transcript JSON to caption from
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Caption style preset: bold|minimal|neon
        #[arg(long)]
        style: Option<String>,

        /// Skip caption burn-in
        #[arg(long)]
        no_captions: bool,
    },

    /// Print the timeline a request would render
    Plan {
        /// Path to the request JSON
        request: PathBuf,

        /// Voiceover length to pace against, instead of probing the file
        #[arg(long)]
        audio_secs: Option<f64>,
    },

    /// Write a subtitle file from a transcript
    Captions {
        /// Path to the transcript JSON
        transcript: PathBuf,

        /// Subtitle format
        #[arg(long, value_enum, default_value = "ass")]
        format: FormatArg,

        /// Caption style preset: bold|minimal|neon
        #[arg(long, default_value = "bold")]
        style: String,

        /// Output file (defaults to the transcript path with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the ffmpeg toolchain
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    reelsmith_common::logging::init_cli_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Render {
            request,
            output_dir,
            transcript,
            style,
            no_captions,
        } => {
            commands::render::run(
                config,
                request,
                output_dir,
                transcript,
                style,
                !no_captions,
            )
            .await
        }
        Commands::Plan {
            request,
            audio_secs,
        } => commands::plan::run(&config, request, audio_secs).await,
        Commands::Captions {
            transcript,
            format,
            style,
            output,
        } => commands::captions::run(&config, transcript, format.into(), &style, output),
        Commands::Check => commands::check::run(&config).await,
    }
}
