//! Per-job processing pipeline.
//!
//! Linear phase machine: size recheck, fetch, decode, duration check,
//! transcription, delivery. Every phase reports progress by editing the
//! job's status message; failures collapse to one classified user message.
//! The boolean result feeds the worker's completed/failed log line, never
//! an exception.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::audio::{self, AudioDecoder, MIN_DURATION_SECS, TARGET_SAMPLE_RATE};
use crate::classify;
use crate::error::AdmissionError;
use crate::job::{TranscriptionJob, extension_for_mime};
use crate::transcribe::SharedEngine;
use crate::transport::{ChatTransport, MESSAGE_SIZE_LIMIT};

pub const MSG_DOWNLOADING: &str = "Downloading your audio file...";
pub const MSG_ANALYZING: &str = "Analyzing audio duration...";
pub const MSG_EMPTY_AUDIO: &str = "The audio file appears to be empty or corrupted.";
pub const MSG_TOO_SHORT: &str =
    "The audio file is too short to transcribe (less than 0.1 seconds).";
pub const MSG_NO_SPEECH: &str = "The audio contained no detectable speech.";

/// Prefix of every delivered transcription message.
pub const TRANSCRIPTION_HEADER: &str = "Transcription:\n\n";

pub struct Pipeline {
    transport: Arc<dyn ChatTransport>,
    decoder: Arc<dyn AudioDecoder>,
    max_file_size: u64,
    size_limit_message: String,
    estimated_secs_per_minute: f32,
}

impl Pipeline {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        decoder: Arc<dyn AudioDecoder>,
        max_file_size: u64,
        estimated_secs_per_minute: f32,
    ) -> Self {
        let size_limit_message = AdmissionError::FileTooLarge {
            limit_mb: max_file_size / (1024 * 1024),
        }
        .to_string();
        Self {
            transport,
            decoder,
            max_file_size,
            size_limit_message,
            estimated_secs_per_minute,
        }
    }

    /// Process a single job with the calling worker's engine.
    ///
    /// Returns `true` on success, including the recognized empty-audio and
    /// too-short terminal states; `false` when the job failed and the user
    /// was told why.
    pub async fn process(&self, job: &TranscriptionJob, engine: &SharedEngine) -> bool {
        match self.run(job, engine).await {
            Ok(completed) => completed,
            Err(err) => {
                error!(
                    chat_id = job.chat_id,
                    file = %job.file_name,
                    error = format!("{err:#}"),
                    "Failed to process job"
                );
                self.report_failure(job, &err).await;
                false
            }
        }
    }

    async fn run(&self, job: &TranscriptionJob, engine: &SharedEngine) -> Result<bool> {
        // The declared size may be stale or forged; recheck before any
        // network I/O.
        if job.file_size > self.max_file_size {
            self.edit_status(job, &self.size_limit_message).await?;
            return Ok(false);
        }

        self.edit_status(job, MSG_DOWNLOADING).await?;

        info!(file = %job.file_name, "Downloading file");
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let audio_path = scratch
            .path()
            .join(format!("audio{}", extension_for_mime(&job.mime_type)));
        self.transport
            .fetch_file(&job.file_id, &audio_path)
            .await
            .context("Failed to download file")?;
        info!(file = %job.file_name, "Finished downloading");

        self.edit_status(job, MSG_ANALYZING).await?;

        let samples = self.decoder.decode_and_resample(&audio_path).await?;
        if samples.is_empty() {
            warn!(file = %job.file_name, "Empty audio file");
            self.reply(job, MSG_EMPTY_AUDIO).await?;
            return Ok(true);
        }

        let duration = audio::duration_secs(&samples);
        if duration < MIN_DURATION_SECS {
            warn!(file = %job.file_name, duration_secs = duration, "Audio too short to transcribe");
            self.reply(job, MSG_TOO_SHORT).await?;
            return Ok(true);
        }

        let estimated_secs = (duration / 60.0 * self.estimated_secs_per_minute).max(2.0);
        self.edit_status(
            job,
            &format!("Processing your audio. Estimated time: {estimated_secs:.0} seconds."),
        )
        .await?;

        info!(file = %job.file_name, duration_secs = duration, "Starting transcription");
        let text = transcribe_blocking(engine.clone(), samples).await?;
        info!(file = %job.file_name, "Finished transcription");

        // Scratch files are only needed up to transcription.
        drop(scratch);

        self.deliver(job, &text).await?;
        Ok(true)
    }

    /// Send the transcription back, split into messages that fit under the
    /// transport's size ceiling with the header included.
    async fn deliver(&self, job: &TranscriptionJob, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            self.reply(job, MSG_NO_SPEECH).await?;
            return Ok(());
        }

        let max_body = MESSAGE_SIZE_LIMIT - TRANSCRIPTION_HEADER.chars().count();
        for chunk in split_chunks(text, max_body) {
            self.reply(job, &format!("{TRANSCRIPTION_HEADER}{chunk}"))
                .await?;
        }
        Ok(())
    }

    /// Tell the submitter their job failed, in plain language.
    ///
    /// Best-effort: a failure to deliver the notification is logged and
    /// swallowed, never propagated.
    async fn report_failure(&self, job: &TranscriptionJob, error: &anyhow::Error) {
        let message = classify::classify(error);
        if let Err(notify_err) = self
            .transport
            .send_message(job.chat_id, message, Some(job.message_id))
            .await
        {
            error!(
                chat_id = job.chat_id,
                error = format!("{notify_err:#}"),
                "Failed to notify user about error"
            );
        }
    }

    /// Best-effort removal of the job's status message once the job has
    /// terminated. The message may already be gone; failures are swallowed.
    pub async fn cleanup_status(&self, job: &TranscriptionJob) {
        if let Err(err) = self
            .transport
            .delete_message(job.chat_id, job.status_message_id)
            .await
        {
            debug!(
                chat_id = job.chat_id,
                error = format!("{err:#}"),
                "Could not delete status message"
            );
        }
    }

    async fn edit_status(&self, job: &TranscriptionJob, text: &str) -> Result<()> {
        self.transport
            .edit_message(job.chat_id, job.status_message_id, text)
            .await
            .context("Failed to update status message")
    }

    async fn reply(&self, job: &TranscriptionJob, text: &str) -> Result<()> {
        self.transport
            .send_message(job.chat_id, text, Some(job.message_id))
            .await
            .map(|_| ())
            .context("Failed to send result message")
    }
}

/// Run blocking inference on the dedicated blocking pool so it never
/// stalls the scheduler driving the queue and the other workers.
async fn transcribe_blocking(engine: SharedEngine, samples: Vec<f32>) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let mut engine = engine.lock().expect("speech engine lock poisoned");
        engine.transcribe(&samples, TARGET_SAMPLE_RATE)
    })
    .await
    .context("Transcription task failed")?
}

/// Split text into chunks of at most `max_chars` characters, on character
/// boundaries, preserving the exact character sequence end to end.
pub(crate) fn split_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    debug_assert!(max_chars > 0);
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.char_indices().nth(max_chars) {
            Some((split_at, _)) => {
                let (head, tail) = rest.split_at(split_at);
                chunks.push(head);
                rest = tail;
            }
            None => {
                chunks.push(rest);
                break;
            }
        }
    }
    chunks
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
