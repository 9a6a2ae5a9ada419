pub mod commands;
pub mod controller;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod session;
pub mod state;
pub mod text;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use commands::{Command, Reader, Reply};
use controller::PlaybackController;
use engine::timed::TimedSpeechEngine;
use engine::{EventReceiver, Voice};

pub use controller::{EventOutcome, ReaderView, ToggleOutcome};
pub use error::{ReaderError, ReaderResult};
pub use state::{PlaybackState, Settings};

#[derive(Debug, Parser)]
#[command(name = "quasselo", version, about = "Read text aloud word by word")]
pub struct Cli {
    /// Text file to load and prepare on start
    pub file: Option<PathBuf>,
    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Speech rate for this run, 0.5 to 2.0
    #[arg(long)]
    pub rate: Option<f32>,
    /// Base pace of the built-in voice in words per minute
    #[arg(long)]
    pub wpm: Option<u32>,
}

fn builtin_voices() -> Vec<Voice> {
    [
        ("timed-de-f", "Katja (timed)", "de-DE"),
        ("timed-de-m", "Markus (timed)", "de-DE"),
        ("timed-en", "Daniel (timed)", "en-GB"),
    ]
    .into_iter()
    .map(|(id, name, language)| Voice {
        id: id.to_string(),
        name: name.to_string(),
        language: language.to_string(),
    })
    .collect()
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("quasselo=info,quasselo_lib=info")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Quasselo v{}", env!("CARGO_PKG_VERSION"));

    let settings_path = match cli.settings.clone() {
        Some(path) => Some(path),
        None => match persistence::settings_path() {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("{}. Settings will not be saved.", e);
                None
            }
        },
    };
    let mut settings = settings_path
        .as_deref()
        .map(persistence::load_settings)
        .unwrap_or_default();
    if let Some(wpm) = cli.wpm {
        settings.playback.words_per_minute = wpm;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        let engine = TimedSpeechEngine::new(settings.playback.words_per_minute)
            .with_voices(builtin_voices());
        let (mut controller, events) = PlaybackController::new(engine, settings);

        if let Some(rate) = cli.rate {
            let applied = controller.set_rate(rate)?;
            tracing::info!("Rate {} for this run", applied);
        }

        if let Some(path) = &cli.file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            controller.set_name(name);
            controller.text_changed(text);
            match controller.prepare() {
                Ok(count) => println!("Loaded {} ({} words).", path.display(), count),
                Err(e) => println!("{}: {}", path.display(), e),
            }
        }

        event_loop(Reader::new(controller, settings_path), events).await
    })
}

async fn event_loop(
    mut reader: Reader<TimedSpeechEngine>,
    mut events: EventReceiver,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", commands::HELP);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Some(message) = commands::handle_event(&mut reader, event) {
                    println!("{}", message);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => match commands::execute(&mut reader, command) {
                        Ok(Reply::Message(message)) => println!("{}", message),
                        Ok(Reply::Silent) => {}
                        Ok(Reply::Quit) => break,
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    reader.controller.stop();
    tracing::info!("Bye");
    Ok(())
}
