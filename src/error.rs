//! User-facing admission errors.
//!
//! The `Display` text of each variant is sent to the submitter verbatim, so
//! the wording here is the product copy for every rejection before a job is
//! created.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("File is too large. The limit is {limit_mb} MB.")]
    FileTooLarge { limit_mb: u64 },

    #[error("The processing queue is full ({capacity} jobs). Please try again in a few minutes.")]
    QueueFull { capacity: usize },

    #[error(
        "You already have {active} file(s) in the queue. The limit is {limit} per user. Please wait for them to finish."
    )]
    TooManyJobs { active: usize, limit: usize },
}
