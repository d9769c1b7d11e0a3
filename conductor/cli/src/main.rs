//! Lesson CLI
//!
//! Terminal surface for a teaching session. Reads commands from stdin,
//! forwards them to the conductor and prints what the conductor reports.
//!
//! # Usage
//!
//! ```bash
//! # Open deck 7 against a local backend
//! lesson --deck 7
//!
//! # Against a remote backend, machine-readable output
//! TUTOR_API_TOKEN=... lesson --api-url https://tutor.example.edu --json
//!
//! # With verbose logging
//! RUST_LOG=lesson_core=debug lesson --deck 7
//! ```
//!
//! # Environment Variables
//!
//! - `TUTOR_API_URL`: API root (default: `http://localhost:8000`)
//! - `TUTOR_API_TOKEN`: Bearer token from the login flow
//! - `TUTOR_TIMEOUT_SECS`: Per-request timeout
//! - `RUST_LOG`: Log filter (overrides `--log-level`)
//!
//! Logs go to stderr; stdout carries only session output.

mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use lesson_core::{
    load_config, load_config_from_path, ConfigOverrides, DeckId, HttpBackend, TeachingConductor,
    TutorMessage,
};

use crate::commands::{parse_command, Command, HELP};
use crate::render::Renderer;

/// Step through a slide deck with the AI teacher
#[derive(Debug, Parser)]
#[command(name = "lesson", version, about)]
struct Args {
    /// Deck to open on start
    #[arg(long)]
    deck: Option<DeckId>,

    /// API root
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "TUTOR_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Config file (default: ~/.config/ai-tutor/session.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print each message as a JSON line
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.api_url {
            overrides = overrides.with_base_url(url.clone());
        }
        if let Some(ref token) = self.token {
            overrides = overrides.with_token(token.clone());
        }
        if let Some(secs) = self.timeout_secs {
            overrides = overrides.with_timeout_secs(secs);
        }
        overrides
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lesson={level},lesson_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line configuration")?;

    info!(
        base_url = %config.api.base_url,
        source = %config.source(),
        authenticated = config.api.token.is_some(),
        "Configuration loaded"
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<TutorMessage>();
    let backend = HttpBackend::from_config(&config.api);
    let mut conductor = TeachingConductor::new(backend, config.conductor.clone(), tx);
    let mut renderer = Renderer::new(std::io::stdout(), args.json);

    conductor.start().await?;
    if let Some(deck) = args.deck {
        conductor.select_deck(Some(deck));
    } else if !args.json {
        renderer.line("Pick a deck with 'deck <id>' ('help' lists commands)")?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutting_down = false;

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                renderer.render(&msg)?;
                if matches!(msg, TutorMessage::Quit { .. }) {
                    break;
                }
            }

            completion = conductor.recv_completion(), if conductor.in_flight() > 0 => {
                if let Some(completion) = completion {
                    conductor.apply_completion(completion);
                }
            }

            line = lines.next_line(), if !shutting_down => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match parse_command(&line) {
                        Ok(Command::Event(event)) => conductor.handle_event(event)?,
                        Ok(Command::Help) => renderer.line(HELP)?,
                        Ok(Command::Empty) => {}
                        Err(e) => renderer.line(&e.to_string())?,
                    },
                    None => {
                        info!("Input closed");
                        conductor.shutdown()?;
                    }
                }
            }

            result = tokio::signal::ctrl_c(), if !shutting_down => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted");
                conductor.shutdown()?;
            }
        }

        shutting_down = conductor.state() == lesson_core::ConductorState::ShuttingDown;
    }

    info!(
        live_handles = conductor.tracker().live_count(),
        "Session closed"
    );
    Ok(())
}
