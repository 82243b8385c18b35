//! Audio decoding for transcription.
//!
//! Whisper consumes 16 kHz mono f32 samples; everything users send (OGG
//! voice notes, mp3, m4a, ...) is normalized to that shape first. Duration
//! checks run on the decoded samples, not on container metadata.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Reference sample rate for all decoded audio.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Anything shorter than this is reported back instead of transcribed.
pub const MIN_DURATION_SECS: f32 = 0.1;

/// Decodes an audio file into 16 kHz mono f32 samples.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn decode_and_resample(&self, path: &Path) -> Result<Vec<f32>>;
}

/// Decoder backed by an ffmpeg subprocess.
///
/// ffmpeg handles every container/codec users throw at the bot and writes
/// raw s16le to stdout, so no intermediate file is needed.
pub struct FfmpegDecoder;

#[async_trait]
impl AudioDecoder for FfmpegDecoder {
    async fn decode_and_resample(&self, path: &Path) -> Result<Vec<f32>> {
        let output = Command::new("ffmpeg")
            .arg("-nostdin")
            .args(["-threads", "0"])
            .arg("-i")
            .arg(path)
            .args(["-f", "s16le", "-ac", "1", "-acodec", "pcm_s16le"])
            .args(["-ar", "16000"])
            .arg("-")
            .output()
            .await
            .context("Failed to run ffmpeg (is it installed?)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Failed to decode audio: {}",
                stderr.lines().last().unwrap_or("unknown ffmpeg error")
            );
        }

        let samples = samples_from_pcm16(&output.stdout);
        debug!(
            path = %path.display(),
            samples = samples.len(),
            duration_secs = duration_secs(&samples),
            "Decoded audio"
        );
        Ok(samples)
    }
}

/// Convert little-endian signed 16-bit PCM bytes to f32 in [-1.0, 1.0).
pub fn samples_from_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Duration of a decoded sample buffer at the reference rate.
pub fn duration_secs(samples: &[f32]) -> f32 {
    samples.len() as f32 / TARGET_SAMPLE_RATE as f32
}

#[cfg(test)]
#[path = "audio_test.rs"]
mod tests;
