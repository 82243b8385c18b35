//! Bot runner that wires all components and drives the update loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::admission::AdmissionControl;
use crate::audio::FfmpegDecoder;
use crate::config::Config;
use crate::handler::{self, BotContext};
use crate::models::{ModelManager, model_id_for};
use crate::pipeline::Pipeline;
use crate::queue::JobQueue;
use crate::transcribe::{EngineFactory, SpeechEngine, WhisperEngine};
use crate::transport::TelegramTransport;
use crate::worker::WorkerPool;

/// Long-poll timeout for getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the bot until interrupted.
pub async fn run(config: Config) -> Result<()> {
    anyhow::ensure!(
        !config.telegram.token.is_empty(),
        "No bot token configured: set TELEGRAM_BOT_TOKEN or [telegram] token"
    );

    let models = ModelManager::new()?;
    let model_path = models
        .ensure_model(model_id_for(config.model.model))
        .await
        .context("Failed to prepare speech model")?;
    let language = match config.model.language.as_str() {
        "auto" | "" => None,
        lang => Some(lang.to_string()),
    };

    let transport = Arc::new(TelegramTransport::new(
        &config.telegram.api_url,
        &config.telegram.token,
    ));
    let admission = Arc::new(AdmissionControl::new(
        config.max_file_size_bytes(),
        config.limits.max_jobs_per_user,
    ));
    let queue = Arc::new(JobQueue::new(config.limits.queue_capacity));
    let pipeline = Arc::new(Pipeline::new(
        transport.clone(),
        Arc::new(FfmpegDecoder),
        config.max_file_size_bytes(),
        config.processing.estimated_secs_per_minute,
    ));

    // Each worker loads its own copy of the model; whisper states are not
    // safe for concurrent inference.
    let factory: Arc<EngineFactory> = {
        let model_path = model_path.clone();
        Arc::new(move |ordinal| {
            info!(worker = ordinal, "Loading speech model");
            let engine = WhisperEngine::new(&model_path, language.clone())?;
            Ok(Box::new(engine) as Box<dyn SpeechEngine>)
        })
    };

    let cancel = CancellationToken::new();
    let pool = WorkerPool::spawn(
        config.limits.workers,
        queue.clone(),
        admission.clone(),
        pipeline,
        factory,
        cancel.clone(),
    );
    info!(workers = config.limits.workers, "Started worker pool");

    let ctx = Arc::new(BotContext {
        transport: transport.clone(),
        admission,
        queue,
        workers: config.limits.workers,
    });

    info!("Bot is running, press Ctrl+C to stop");
    poll_updates(&transport, &ctx, &cancel).await;

    cancel.cancel();
    pool.join().await;
    info!("Bot stopped");
    Ok(())
}

/// Long-poll Telegram for updates, spawning one handler task per inbound
/// message, until Ctrl+C.
async fn poll_updates(
    transport: &Arc<TelegramTransport>,
    ctx: &Arc<BotContext>,
    cancel: &CancellationToken,
) {
    let mut offset = 0i64;
    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                cancel.cancel();
                return;
            }
            updates = transport.get_updates(offset, POLL_TIMEOUT_SECS) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = format!("{err:#}"), "getUpdates failed, backing off");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(incoming) = update.into_incoming() else {
                continue;
            };
            let ctx = ctx.clone();
            let chat_id = incoming.chat_id;
            tokio::spawn(async move {
                if let Err(err) = handler::handle_message(&ctx, incoming).await {
                    error!(
                        chat_id,
                        error = format!("{err:#}"),
                        "Failed to handle update"
                    );
                }
            });
        }
    }
}
