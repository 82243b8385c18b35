//! Speech-to-text transcription.
//!
//! This module provides a trait abstraction for transcription backends
//! and the whisper.cpp implementation.

use std::sync::{Arc, Mutex};

use anyhow::Result;

mod whisper;

pub use whisper::WhisperEngine;

/// Speech-to-text engine.
///
/// Inference is blocking and the backing model is not safe for concurrent
/// use, so each worker owns exactly one engine and drives it from the
/// blocking thread pool.
pub trait SpeechEngine: Send {
    /// Transcribe audio samples to text.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as f32, expected to be 16kHz mono
    /// * `sample_rate` - Sample rate of the audio in Hz (must be 16000)
    ///
    /// # Returns
    /// The transcribed text, or an error if transcription failed.
    fn transcribe(&mut self, audio: &[f32], sample_rate: u32) -> Result<String>;
}

/// A worker's private engine handle.
///
/// The mutex exists only to move the engine in and out of `spawn_blocking`
/// closures; no two workers ever hold clones of the same handle.
pub type SharedEngine = Arc<Mutex<Box<dyn SpeechEngine>>>;

/// Builds the engine for the worker with the given ordinal.
///
/// Runs once per worker at pool startup, on the blocking pool (model
/// loading reads hundreds of megabytes).
pub type EngineFactory = dyn Fn(usize) -> Result<Box<dyn SpeechEngine>> + Send + Sync;
