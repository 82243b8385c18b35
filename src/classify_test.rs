use super::*;
use anyhow::{Context, anyhow};

#[test]
fn download_errors_map_to_download_message() {
    let err = anyhow!("Download interrupted by peer");
    assert_eq!(classify(&err), DOWNLOAD_FAILED);
}

#[test]
fn file_errors_map_to_download_message() {
    let err = anyhow!("no such FILE or directory");
    assert_eq!(classify(&err), DOWNLOAD_FAILED);
}

#[test]
fn zero_element_tensor_maps_to_unprocessable() {
    let err = anyhow!("cannot reshape tensor of 0 elements into shape [1, 0]");
    assert_eq!(classify(&err), UNPROCESSABLE);
}

#[test]
fn whisper_errors_map_to_transcription_message() {
    let err = anyhow!("whisper inference returned status -1");
    assert_eq!(classify(&err), TRANSCRIPTION_FAILED);
}

#[test]
fn transcribe_errors_map_to_transcription_message() {
    let err = anyhow!("failed to TRANSCRIBE segment 3");
    assert_eq!(classify(&err), TRANSCRIPTION_FAILED);
}

#[test]
fn unrecognized_errors_map_to_generic_message() {
    let err = anyhow!("out of memory");
    assert_eq!(classify(&err), GENERIC_FAILURE);
}

#[test]
fn download_takes_precedence_over_transcription() {
    // First match wins: "file" appears before the whisper pattern applies.
    let err = anyhow!("whisper could not open file");
    assert_eq!(classify(&err), DOWNLOAD_FAILED);
}

#[test]
fn context_chain_participates_in_the_match() {
    let root = anyhow!("connection reset");
    let err = root.context("failed to download file part 2");
    assert_eq!(classify(&err), DOWNLOAD_FAILED);
}
