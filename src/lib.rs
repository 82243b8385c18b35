//! voxgram: a Telegram bot that transcribes voice messages and audio files
//! with whisper.cpp.

pub mod admission;
pub mod audio;
pub mod bot;
pub mod classify;
pub mod config;
pub mod dirs;
pub mod error;
pub mod handler;
pub mod job;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod transcribe;
pub mod transport;
pub mod worker;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Application-specific environment variable for log filtering (overrides config).
const LOG_ENV_VAR: &str = "VOXGRAM_LOG";

/// Entry point for the bot process: configures logging and launches the bot.
pub async fn run() -> Result<()> {
    let mut config = config::Config::load().unwrap_or_default();
    config.overlay_env();

    // VOXGRAM_LOG env var overrides config file level
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(config.logging.level.as_directive().parse()?)
        .from_env()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Route whisper.cpp and GGML logs through tracing
    whisper_rs::install_logging_hooks();

    bot::run(config).await
}
