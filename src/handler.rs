//! Inbound message handling.
//!
//! One handler invocation per inbound chat message: commands get canned
//! replies; audio goes through admission (size, global capacity, per-user
//! ceiling, in that order) and into the queue.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::admission::AdmissionControl;
use crate::error::AdmissionError;
use crate::job::{AudioDescriptor, TranscriptionJob};
use crate::queue::JobQueue;
use crate::transport::{ChatTransport, Incoming};

pub const MSG_QUEUEING: &str = "Queueing your audio file...";

/// Shared bot components, wired once at startup and handed to every
/// handler task and worker.
pub struct BotContext {
    pub transport: Arc<dyn ChatTransport>,
    pub admission: Arc<AdmissionControl>,
    pub queue: Arc<JobQueue>,
    /// Worker count, quoted in the /help text.
    pub workers: usize,
}

/// Dispatch one inbound message.
pub async fn handle_message(ctx: &BotContext, incoming: Incoming) -> Result<()> {
    if let Some(text) = incoming.text.as_deref() {
        let text = text.trim();
        if text.starts_with("/start") {
            return handle_start(ctx, &incoming).await;
        }
        if text.starts_with("/help") {
            return handle_help(ctx, &incoming).await;
        }
    }

    if let Some(audio) = incoming.audio.clone() {
        return handle_audio(ctx, &incoming, &audio).await;
    }

    Ok(())
}

async fn handle_start(ctx: &BotContext, incoming: &Incoming) -> Result<()> {
    let limit_mb = ctx.admission.max_file_size() / (1024 * 1024);
    ctx.transport
        .send_message(
            incoming.chat_id,
            &format!(
                "Hi! Send me a voice message or audio file (up to {limit_mb} MB), and I'll transcribe it for you."
            ),
            None,
        )
        .await?;
    Ok(())
}

async fn handle_help(ctx: &BotContext, incoming: &Incoming) -> Result<()> {
    ctx.transport
        .send_message(
            incoming.chat_id,
            &format!(
                "Send me any voice message or audio file, and I'll convert it to text. \
                 I can process up to {} files at the same time. If the queue is full, please wait.",
                ctx.workers
            ),
            None,
        )
        .await?;
    Ok(())
}

/// Admit an audio submission into the queue, or explain why not.
async fn handle_audio(
    ctx: &BotContext,
    incoming: &Incoming,
    audio: &AudioDescriptor,
) -> Result<()> {
    if let Err(rejection) = ctx.admission.validate_size(audio) {
        ctx.transport
            .send_message(
                incoming.chat_id,
                &rejection.to_string(),
                Some(incoming.message_id),
            )
            .await?;
        return Ok(());
    }

    // Immediate feedback while the job is admitted; this message becomes
    // the job's status message afterwards.
    let status_message_id = ctx
        .transport
        .send_message(incoming.chat_id, MSG_QUEUEING, None)
        .await?;

    // Two independent gates, global capacity first, then the per-user
    // ceiling. The queue-full path must not touch the user's counter.
    let rejection = if ctx.queue.is_full() {
        Some(AdmissionError::QueueFull {
            capacity: ctx.queue.capacity(),
        })
    } else {
        ctx.admission.try_admit(incoming.chat_id).err()
    };

    if let Some(rejection) = rejection {
        info!(
            chat_id = incoming.chat_id,
            rejection = %rejection,
            "Rejected audio submission"
        );
        ctx.transport
            .edit_message(incoming.chat_id, status_message_id, &rejection.to_string())
            .await?;
        return Ok(());
    }

    let job = TranscriptionJob::new(
        incoming.chat_id,
        incoming.message_id,
        audio,
        status_message_id,
    );
    ctx.queue.put(job).await;

    let position = ctx.queue.len();
    info!(
        chat_id = incoming.chat_id,
        position,
        "Job added to queue"
    );
    ctx.transport
        .edit_message(
            incoming.chat_id,
            status_message_id,
            &format!("Your file has been queued for processing. Position: {position}"),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "handler_test.rs"]
mod tests;
