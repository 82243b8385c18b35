//! Worker pool that drains the job queue.
//!
//! Each worker is a long-running task bound to exactly one speech engine,
//! built for it at startup. Workers terminate only on shutdown; a single
//! job can fail, panic, or hang its own worker, but never take the pool
//! down with it.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::admission::AdmissionControl;
use crate::pipeline::Pipeline;
use crate::queue::JobQueue;
use crate::transcribe::{EngineFactory, SharedEngine};

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `count` workers draining `queue`.
    ///
    /// Each worker obtains its own engine from `factory`, keyed by its
    /// ordinal. Engines are never shared or handed across workers.
    pub fn spawn(
        count: usize,
        queue: Arc<JobQueue>,
        admission: Arc<AdmissionControl>,
        pipeline: Arc<Pipeline>,
        factory: Arc<EngineFactory>,
        cancel: CancellationToken,
    ) -> Self {
        let handles = (0..count)
            .map(|ordinal| {
                tokio::spawn(worker_loop(
                    ordinal,
                    queue.clone(),
                    admission.clone(),
                    pipeline.clone(),
                    factory.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to stop. Call after cancelling the pool's
    /// token.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    ordinal: usize,
    queue: Arc<JobQueue>,
    admission: Arc<AdmissionControl>,
    pipeline: Arc<Pipeline>,
    factory: Arc<EngineFactory>,
    cancel: CancellationToken,
) {
    // Fail closed: a worker that cannot obtain its model logs and exits,
    // contributing zero throughput instead of crashing the process.
    let engine = match tokio::task::spawn_blocking(move || factory(ordinal)).await {
        Ok(Ok(engine)) => engine,
        Ok(Err(err)) => {
            error!(
                worker = ordinal,
                error = format!("{err:#}"),
                "Failed to load model, worker exiting"
            );
            return;
        }
        Err(join_err) => {
            error!(
                worker = ordinal,
                error = %join_err,
                "Model loading panicked, worker exiting"
            );
            return;
        }
    };
    let engine: SharedEngine = Arc::new(Mutex::new(engine));
    info!(worker = ordinal, "Worker ready");

    loop {
        let job = tokio::select! {
            _ = cancel.cancelled() => break,
            job = queue.get() => job,
        };
        info!(worker = ordinal, chat_id = job.chat_id, "Picked up job");

        // The pipeline converts business failures to `false` itself; a
        // panic escaping it is a bug-class event that still must not kill
        // the worker or skip cleanup.
        match AssertUnwindSafe(pipeline.process(&job, &engine))
            .catch_unwind()
            .await
        {
            Ok(true) => info!(worker = ordinal, chat_id = job.chat_id, "Completed job"),
            Ok(false) => info!(worker = ordinal, chat_id = job.chat_id, "Failed job"),
            Err(_) => error!(
                worker = ordinal,
                chat_id = job.chat_id,
                "Job processing panicked"
            ),
        }

        pipeline.cleanup_status(&job).await;

        // The admission slot was charged when the job was queued; release
        // it exactly once, whatever the outcome.
        admission.release(job.chat_id);
    }

    info!(worker = ordinal, "Worker stopped");
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
