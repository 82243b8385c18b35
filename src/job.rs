//! Job data model.
//!
//! An [`AudioDescriptor`] captures what the transport reports about an
//! inbound file; a [`TranscriptionJob`] is the immutable unit of work built
//! from it once the request has been admitted.

/// Metadata for an inbound audio file, as reported by the chat transport.
///
/// The declared size is an untrusted upper bound from transport metadata;
/// the file bytes themselves are fetched lazily by the worker, not at
/// admission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDescriptor {
    /// Opaque handle used to fetch the file bytes later.
    pub file_id: String,
    /// Declared size in bytes.
    pub file_size: u64,
    /// MIME type as reported, e.g. `audio/ogg`. Not validated.
    pub mime_type: String,
    /// Original file name, if the transport knows one.
    pub file_name: Option<String>,
    /// Stable identifier used to synthesize a name when absent.
    pub file_unique_id: String,
}

/// Everything a worker needs to process one transcription request.
///
/// Immutable after construction; exactly one job exists per admitted
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJob {
    pub chat_id: i64,
    /// The user's message carrying the audio; results reply to it.
    pub message_id: i64,
    pub file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    /// The "Queueing..." status message, edited as the job progresses and
    /// deleted when the job terminates.
    pub status_message_id: i64,
}

impl TranscriptionJob {
    /// Build a job from an admitted descriptor plus addressing info.
    pub fn new(
        chat_id: i64,
        message_id: i64,
        audio: &AudioDescriptor,
        status_message_id: i64,
    ) -> Self {
        Self {
            chat_id,
            message_id,
            file_id: audio.file_id.clone(),
            file_name: resolve_file_name(audio),
            mime_type: audio.mime_type.clone(),
            file_size: audio.file_size,
            status_message_id,
        }
    }
}

/// Derive a display name for the file.
///
/// Voice notes arrive without a name; everything else gets a synthesized
/// one based on its unique id and MIME subtype.
fn resolve_file_name(audio: &AudioDescriptor) -> String {
    if let Some(name) = &audio.file_name {
        return name.clone();
    }
    if audio.mime_type == "audio/ogg" {
        return "voice_message.ogg".to_string();
    }
    let subtype = audio
        .mime_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or("bin");
    format!("audio_file_{}.{}", audio.file_unique_id, subtype)
}

/// File extension for the scratch copy of the download, by MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => ".m4a",
        "audio/wav" | "audio/x-wav" => ".wav",
        "audio/flac" | "audio/x-flac" => ".flac",
        "audio/aac" => ".aac",
        "audio/webm" => ".webm",
        // Telegram voice notes are OGG/Opus; also the fallback.
        _ => ".ogg",
    }
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
