//! Telegram Bot API transport.
//!
//! Plain HTTPS Bot API client: long polling via `getUpdates`, message
//! operations, and file downloads through `getFile`. Only the handful of
//! fields the bot reads are deserialized.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{ChatTransport, Incoming};
use crate::job::AudioDescriptor;

pub struct TelegramTransport {
    http: reqwest::Client,
    /// `{api_url}/bot{token}`
    base_url: String,
    /// `{api_url}/file/bot{token}`
    file_base_url: String,
}

impl TelegramTransport {
    pub fn new(api_url: &str, token: &str) -> Self {
        let api_url = api_url.trim_end_matches('/');
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{api_url}/bot{token}"),
            file_base_url: format!("{api_url}/file/bot{token}"),
        }
    }

    /// Call a Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, payload: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Telegram API request failed: {method}"))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Telegram API returned malformed JSON: {method}"))?;

        if !envelope.ok {
            anyhow::bail!(
                "Telegram API error in {method}: {}",
                envelope.description.as_deref().unwrap_or("no description")
            );
        }
        envelope
            .result
            .with_context(|| format!("Telegram API response missing result: {method}"))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn fetch_file(&self, file_id: &str, dest: &Path) -> Result<()> {
        let info: FileInfo = self
            .call("getFile", json!({ "file_id": file_id }))
            .await
            .context("Failed to resolve file for download")?;
        let file_path = info
            .file_path
            .context("Telegram did not return a download path for the file")?;

        let response = self
            .http
            .get(format!("{}/{file_path}", self.file_base_url))
            .send()
            .await
            .context("Failed to download file")?
            .error_for_status()
            .context("File download rejected")?;

        let mut out = tokio::fs::File::create(dest)
            .await
            .context("Failed to create download destination")?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("File download interrupted")?;
            out.write_all(&chunk)
                .await
                .context("Failed to write downloaded file")?;
        }
        out.flush().await.context("Failed to flush downloaded file")?;

        debug!(file_id = %file_id, dest = %dest.display(), "Downloaded file");
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<i64> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if let Some(message_id) = reply_to {
            payload["reply_to_message_id"] = json!(message_id);
        }
        let message: Message = self.call("sendMessage", payload).await?;
        Ok(message.message_id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_path: Option<String>,
}

/// One entry from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<FileAttachment>,
    #[serde(default)]
    pub audio: Option<FileAttachment>,
    #[serde(default)]
    pub document: Option<FileAttachment>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Shared shape of `voice`, `audio`, and `document` attachments.
#[derive(Debug, Deserialize)]
pub struct FileAttachment {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Update {
    /// Reduce an update to the transport-agnostic event the bot handles.
    pub fn into_incoming(self) -> Option<Incoming> {
        let message = self.message?;
        let audio = extract_audio(&message);
        Some(Incoming {
            chat_id: message.chat.id,
            message_id: message.message_id,
            text: message.text,
            audio,
        })
    }
}

/// Pull an [`AudioDescriptor`] out of a message, if it carries audio.
///
/// Voice notes and audio files always count; generic documents only when
/// their MIME type says `audio/*`.
fn extract_audio(message: &Message) -> Option<AudioDescriptor> {
    if let Some(voice) = &message.voice {
        return Some(descriptor_from(voice, "audio/ogg"));
    }
    if let Some(audio) = &message.audio {
        return Some(descriptor_from(audio, "audio/mpeg"));
    }
    if let Some(document) = &message.document
        && document
            .mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("audio/"))
    {
        return Some(descriptor_from(document, "audio/ogg"));
    }
    None
}

fn descriptor_from(attachment: &FileAttachment, default_mime: &str) -> AudioDescriptor {
    AudioDescriptor {
        file_id: attachment.file_id.clone(),
        file_size: attachment.file_size.unwrap_or(0),
        mime_type: attachment
            .mime_type
            .clone()
            .unwrap_or_else(|| default_mime.to_string()),
        file_name: attachment.file_name.clone(),
        file_unique_id: attachment.file_unique_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_update_becomes_audio_incoming() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "chat": { "id": 99 },
                "voice": {
                    "file_id": "vf1",
                    "file_unique_id": "vu1",
                    "duration": 3,
                    "mime_type": "audio/ogg",
                    "file_size": 4321
                }
            }
        }))
        .unwrap();

        let incoming = update.into_incoming().unwrap();
        assert_eq!(incoming.chat_id, 99);
        assert_eq!(incoming.message_id, 5);
        let audio = incoming.audio.unwrap();
        assert_eq!(audio.file_id, "vf1");
        assert_eq!(audio.mime_type, "audio/ogg");
        assert_eq!(audio.file_size, 4321);
        assert_eq!(audio.file_name, None);
    }

    #[test]
    fn voice_without_mime_defaults_to_ogg() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3 },
                "voice": { "file_id": "f", "file_unique_id": "u" }
            }
        }))
        .unwrap();

        let audio = update.into_incoming().unwrap().audio.unwrap();
        assert_eq!(audio.mime_type, "audio/ogg");
        assert_eq!(audio.file_size, 0);
    }

    #[test]
    fn audio_attachment_keeps_its_file_name() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3 },
                "audio": {
                    "file_id": "f",
                    "file_unique_id": "u",
                    "mime_type": "audio/mpeg",
                    "file_name": "song.mp3",
                    "file_size": 1000
                }
            }
        }))
        .unwrap();

        let audio = update.into_incoming().unwrap().audio.unwrap();
        assert_eq!(audio.file_name.as_deref(), Some("song.mp3"));
        assert_eq!(audio.mime_type, "audio/mpeg");
    }

    #[test]
    fn audio_document_is_accepted_non_audio_document_is_not() {
        let audio_doc: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3 },
                "document": {
                    "file_id": "f",
                    "file_unique_id": "u",
                    "mime_type": "audio/flac",
                    "file_name": "take.flac"
                }
            }
        }))
        .unwrap();
        assert!(audio_doc.into_incoming().unwrap().audio.is_some());

        let pdf_doc: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3 },
                "document": {
                    "file_id": "f",
                    "file_unique_id": "u",
                    "mime_type": "application/pdf",
                    "file_name": "paper.pdf"
                }
            }
        }))
        .unwrap();
        assert!(pdf_doc.into_incoming().unwrap().audio.is_none());
    }

    #[test]
    fn text_update_carries_no_audio() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3 },
                "text": "/start"
            }
        }))
        .unwrap();

        let incoming = update.into_incoming().unwrap();
        assert_eq!(incoming.text.as_deref(), Some("/start"));
        assert!(incoming.audio.is_none());
    }

    #[test]
    fn update_without_message_is_dropped() {
        let update: Update = serde_json::from_value(serde_json::json!({ "update_id": 1 })).unwrap();
        assert!(update.into_incoming().is_none());
    }
}
