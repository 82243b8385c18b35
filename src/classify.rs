//! Maps arbitrary pipeline failures to user-facing messages.
//!
//! Internal cause strings are never shown to users; every failure collapses
//! to one of a fixed set of plain-language templates.

pub const DOWNLOAD_FAILED: &str = "Sorry, failed to download your file. Please try again.";
pub const UNPROCESSABLE: &str = "Sorry, this audio file cannot be processed. It may be too short, corrupted, or in an unsupported format.";
pub const TRANSCRIPTION_FAILED: &str =
    "Sorry, failed to transcribe your audio. The file may be corrupted or in an unsupported format.";
pub const GENERIC_FAILURE: &str = "Sorry, an error occurred while processing your file.";

/// Pick the user message for a failed job.
///
/// Case-insensitive substring match over the rendered context chain, first
/// match wins. The tensor-shape patterns predate the current decode path
/// but stay ahead of the generic transcription match so a zero-sample
/// inference failure keeps its more specific message.
pub fn classify(error: &anyhow::Error) -> &'static str {
    // "{:#}" renders the whole context chain, so context attached anywhere
    // along the failure path participates in the match.
    let cause = format!("{error:#}").to_lowercase();

    if cause.contains("download") || cause.contains("file") {
        DOWNLOAD_FAILED
    } else if cause.contains("cannot reshape tensor") || cause.contains("tensor of 0 elements") {
        UNPROCESSABLE
    } else if cause.contains("transcribe") || cause.contains("whisper") {
        TRANSCRIPTION_FAILED
    } else {
        GENERIC_FAILURE
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
