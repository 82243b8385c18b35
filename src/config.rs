//! Configuration management for the voxgram bot.
//!
//! Handles loading, saving, and providing defaults for the bot configuration.
//! Deployment-style settings can be overridden through the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Main configuration struct for the bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub model: ModelConfig,
    pub limits: LimitsConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

/// Telegram Bot API access configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather. Usually supplied via
    /// the `TELEGRAM_BOT_TOKEN` environment variable instead.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Bot API server base URL.
    pub api_url: String,
}

/// Configuration for the speech recognition model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Speech recognition model to use.
    pub model: SpeechModel,
    /// Language to recognize, or "auto" for automatic detection.
    pub language: String,
}

/// Admission and throughput limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted file size in megabytes.
    pub max_file_size_mb: u64,
    /// Maximum number of jobs waiting in the queue.
    pub queue_capacity: usize,
    /// Maximum number of unfinished jobs a single user may hold.
    pub max_jobs_per_user: usize,
    /// Number of transcription workers, each with its own model instance.
    pub workers: usize,
}

/// Tunables for the processing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Estimated transcription seconds per minute of audio, used for the
    /// processing-time estimate shown to the user.
    pub estimated_secs_per_minute: f32,
}

/// Supported speech recognition models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechModel {
    WhisperTiny,
    WhisperTinyEn,
    #[default]
    WhisperBase,
    WhisperBaseEn,
    WhisperSmall,
    WhisperSmallEn,
    WhisperMedium,
    WhisperMediumEn,
    WhisperLargeV3,
    WhisperLargeV3Turbo,
}

impl std::str::FromStr for SpeechModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "whisper-tiny" => Ok(SpeechModel::WhisperTiny),
            "whisper-tiny-en" => Ok(SpeechModel::WhisperTinyEn),
            "whisper-base" => Ok(SpeechModel::WhisperBase),
            "whisper-base-en" => Ok(SpeechModel::WhisperBaseEn),
            "whisper-small" => Ok(SpeechModel::WhisperSmall),
            "whisper-small-en" => Ok(SpeechModel::WhisperSmallEn),
            "whisper-medium" => Ok(SpeechModel::WhisperMedium),
            "whisper-medium-en" => Ok(SpeechModel::WhisperMediumEn),
            "whisper-large-v3" => Ok(SpeechModel::WhisperLargeV3),
            "whisper-large-v3-turbo" => Ok(SpeechModel::WhisperLargeV3Turbo),
            other => anyhow::bail!("Unknown speech model: {other}"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: LogLevel,
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to a tracing filter directive string for the bot crate.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "voxgram=error",
            LogLevel::Warn => "voxgram=warn",
            LogLevel::Info => "voxgram=info",
            LogLevel::Debug => "voxgram=debug",
            LogLevel::Trace => "voxgram=trace",
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: SpeechModel::default(),
            language: "auto".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            queue_capacity: 100,
            max_jobs_per_user: 3,
            workers: 2,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            estimated_secs_per_minute: 13.0,
        }
    }
}

impl Config {
    /// Returns the default config directory path.
    /// `~/.config/voxgram/` (or `$XDG_CONFIG_HOME/voxgram/`)
    pub fn config_dir() -> Result<PathBuf> {
        crate::dirs::config_dir()
    }

    /// Returns the default config file path.
    /// `~/.config/voxgram/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Returns the default data directory path.
    /// `~/.local/share/voxgram/` (or `$XDG_DATA_HOME/voxgram/`)
    pub fn data_dir() -> Result<PathBuf> {
        crate::dirs::data_dir()
    }

    /// Returns the default models directory path.
    /// `~/.local/share/voxgram/models/`
    pub fn models_dir() -> Result<PathBuf> {
        Self::data_dir().map(|p| p.join("models"))
    }

    /// Load configuration from the default path.
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file as TOML")
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Apply environment overrides on top of the file-based configuration.
    ///
    /// `TELEGRAM_BOT_TOKEN`, `WHISPER_MODEL`, `NUM_WORKERS`, and
    /// `MAX_JOBS_PER_USER` take precedence over the config file so the bot
    /// can be configured entirely through its deployment environment.
    pub fn overlay_env(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
            && !token.is_empty()
        {
            self.telegram.token = token;
        }
        if let Ok(model) = std::env::var("WHISPER_MODEL") {
            match model.parse() {
                Ok(model) => self.model.model = model,
                Err(_) => warn!(model = %model, "Ignoring unknown WHISPER_MODEL"),
            }
        }
        if let Ok(workers) = std::env::var("NUM_WORKERS") {
            match workers.parse::<usize>() {
                Ok(workers) if workers > 0 => self.limits.workers = workers,
                _ => warn!(workers = %workers, "Ignoring invalid NUM_WORKERS"),
            }
        }
        if let Ok(limit) = std::env::var("MAX_JOBS_PER_USER") {
            match limit.parse::<usize>() {
                Ok(limit) if limit > 0 => self.limits.max_jobs_per_user = limit,
                _ => warn!(limit = %limit, "Ignoring invalid MAX_JOBS_PER_USER"),
            }
        }
    }

    /// Maximum accepted file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
