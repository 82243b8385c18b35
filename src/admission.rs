//! Admission control: file-size validation and the per-user job ceiling.
//!
//! Admission is charged once per job before it is enqueued and released
//! exactly once when the job terminates, whatever the outcome. All counter
//! reads and writes happen under a single lock, so check-and-increment is
//! one atomic step even under many concurrent submissions from the same
//! user.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::AdmissionError;
use crate::job::AudioDescriptor;

pub struct AdmissionControl {
    max_file_size: u64,
    max_jobs_per_user: usize,
    /// Jobs currently admitted (queued or in flight) per chat. Entries are
    /// purged at zero so the map never grows past the set of active users.
    active: Mutex<HashMap<i64, usize>>,
}

impl AdmissionControl {
    pub fn new(max_file_size: u64, max_jobs_per_user: usize) -> Self {
        Self {
            max_file_size,
            max_jobs_per_user,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Check the declared size against the configured limit.
    ///
    /// Size is the only thing validated at admission; MIME types are not
    /// whitelisted and decode failures surface later in the pipeline.
    pub fn validate_size(&self, audio: &AudioDescriptor) -> Result<(), AdmissionError> {
        if audio.file_size > self.max_file_size {
            return Err(AdmissionError::FileTooLarge {
                limit_mb: self.max_file_size / (1024 * 1024),
            });
        }
        Ok(())
    }

    /// Reserve a job slot for this chat.
    ///
    /// Atomically checks the chat's active count against the ceiling and
    /// increments on success; a rejection leaves the counter untouched and
    /// carries the snapshot the user message needs.
    pub fn try_admit(&self, chat_id: i64) -> Result<(), AdmissionError> {
        let mut active = self.active.lock().expect("admission lock poisoned");
        let count = active.get(&chat_id).copied().unwrap_or(0);
        if count >= self.max_jobs_per_user {
            return Err(AdmissionError::TooManyJobs {
                active: count,
                limit: self.max_jobs_per_user,
            });
        }
        active.insert(chat_id, count + 1);
        Ok(())
    }

    /// Release a previously admitted slot, floored at zero.
    pub fn release(&self, chat_id: i64) {
        let mut active = self.active.lock().expect("admission lock poisoned");
        if let Some(count) = active.get_mut(&chat_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(&chat_id);
            }
        }
    }

    /// Read-only snapshot of the chat's active job count.
    pub fn active_jobs(&self, chat_id: i64) -> usize {
        self.active
            .lock()
            .expect("admission lock poisoned")
            .get(&chat_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

#[cfg(test)]
#[path = "admission_test.rs"]
mod tests;
