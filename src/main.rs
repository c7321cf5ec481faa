//! Консольная утилита построения таймлайна озвучки

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};

use tts_timeline::notification::ConsoleProgressObserver;
use tts_timeline::utils::{ffmpeg, logger};
use tts_timeline::{TimelineConfig, TtsTimeline, VoicePreset};

/// Build one narration track and a time-indexed transcript from annotated text
#[derive(Parser, Debug)]
#[command(name = "tts-timeline", version, about)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "text_file"])))]
struct Cli {
    /// Text to narrate; spans inside <NoTTSHere>…</NoTTSHere> are not spoken
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// Read the text from a file
    #[arg(long, value_name = "PATH")]
    text_file: Option<PathBuf>,

    /// Project name used for the output directory
    #[arg(long, short, value_name = "NAME")]
    project: String,

    /// Voice preset (mandarin, taigi-female-strong, taigi-male-strong, taigi-female-secondary, taigi-male-secondary)
    #[arg(long, short, value_name = "VOICE")]
    voice: Option<VoicePreset>,

    /// Path to a JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print progress updates to stderr
    #[arg(long)]
    progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger();
    let cli = Cli::parse();

    if !ffmpeg::check_ffmpeg_installed().await {
        bail!("ffmpeg and ffprobe must be installed and available in PATH");
    }
    if let Ok(version) = ffmpeg::get_ffmpeg_version().await {
        log::debug!("Using {}", version);
    }

    let config = match &cli.config {
        Some(path) => TimelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TimelineConfig::default(),
    };

    let text = match (&cli.text, &cli.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("either --text or --text-file is required"),
    };

    let voice = cli.voice.unwrap_or(config.voice);

    let mut timeline = TtsTimeline::new(config).context("Failed to initialize timeline builder")?;
    if cli.progress {
        timeline.add_observer(Box::new(ConsoleProgressObserver::new()));
    }

    let result = timeline
        .build(&text, &cli.project, voice)
        .await
        .context("Timeline build failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
