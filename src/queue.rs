//! Bounded FIFO queue of transcription jobs.
//!
//! The queue is the only structure shared by every producer (update
//! handler) and every consumer (worker). Capacity is fixed at construction;
//! `put` blocks while full and `get` blocks while empty.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Semaphore;

use crate::job::TranscriptionJob;

/// Multi-producer multi-consumer bounded FIFO.
///
/// A pair of semaphores tracks free slots and ready jobs; the deque itself
/// is only touched under its mutex with a permit already in hand, so
/// ordering and capacity hold under arbitrary concurrent callers.
pub struct JobQueue {
    jobs: Mutex<VecDeque<TranscriptionJob>>,
    free: Semaphore,
    ready: Semaphore,
    capacity: usize,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(capacity)),
            free: Semaphore::new(capacity),
            ready: Semaphore::new(0),
            capacity,
        }
    }

    /// Number of jobs enqueued and not yet picked up by a worker.
    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a job, waiting for a free slot if the queue is full.
    ///
    /// Callers are expected to check [`is_full`](Self::is_full) before
    /// admitting work, so waiting here is the exception, not the rule.
    pub async fn put(&self, job: TranscriptionJob) {
        let permit = self
            .free
            .acquire()
            .await
            .expect("job queue semaphore never closed");
        permit.forget();
        self.jobs
            .lock()
            .expect("job queue lock poisoned")
            .push_back(job);
        self.ready.add_permits(1);
    }

    /// Dequeue the oldest job, waiting until one is available.
    pub async fn get(&self) -> TranscriptionJob {
        let permit = self
            .ready
            .acquire()
            .await
            .expect("job queue semaphore never closed");
        permit.forget();
        let job = self
            .jobs
            .lock()
            .expect("job queue lock poisoned")
            .pop_front()
            .expect("ready permit implies a queued job");
        self.free.add_permits(1);
        job
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
