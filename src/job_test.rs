use super::*;

fn descriptor(mime_type: &str, file_name: Option<&str>) -> AudioDescriptor {
    AudioDescriptor {
        file_id: "file-1".to_string(),
        file_size: 1024,
        mime_type: mime_type.to_string(),
        file_name: file_name.map(str::to_string),
        file_unique_id: "uniq42".to_string(),
    }
}

#[test]
fn explicit_file_name_wins() {
    let audio = descriptor("audio/mpeg", Some("lecture.mp3"));
    let job = TranscriptionJob::new(1, 2, &audio, 3);
    assert_eq!(job.file_name, "lecture.mp3");
}

#[test]
fn ogg_without_name_is_a_voice_message() {
    let audio = descriptor("audio/ogg", None);
    let job = TranscriptionJob::new(1, 2, &audio, 3);
    assert_eq!(job.file_name, "voice_message.ogg");
}

#[test]
fn unnamed_file_gets_synthesized_name() {
    let audio = descriptor("audio/mpeg", None);
    let job = TranscriptionJob::new(1, 2, &audio, 3);
    assert_eq!(job.file_name, "audio_file_uniq42.mpeg");
}

#[test]
fn malformed_mime_falls_back_to_bin() {
    let audio = descriptor("audio", None);
    let job = TranscriptionJob::new(1, 2, &audio, 3);
    assert_eq!(job.file_name, "audio_file_uniq42.bin");
}

#[test]
fn job_copies_addressing_and_descriptor_fields() {
    let audio = descriptor("audio/ogg", None);
    let job = TranscriptionJob::new(77, 88, &audio, 99);

    assert_eq!(job.chat_id, 77);
    assert_eq!(job.message_id, 88);
    assert_eq!(job.status_message_id, 99);
    assert_eq!(job.file_id, "file-1");
    assert_eq!(job.mime_type, "audio/ogg");
    assert_eq!(job.file_size, 1024);
}

#[test]
fn extension_mapping() {
    assert_eq!(extension_for_mime("audio/mpeg"), ".mp3");
    assert_eq!(extension_for_mime("audio/x-m4a"), ".m4a");
    assert_eq!(extension_for_mime("audio/flac"), ".flac");
    assert_eq!(extension_for_mime("audio/ogg"), ".ogg");
    // Unknown types fall back to ogg, the voice-note container.
    assert_eq!(extension_for_mime("audio/unknown"), ".ogg");
}
