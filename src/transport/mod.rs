//! Chat transport abstraction.
//!
//! The bot core talks to its chat service through [`ChatTransport`], a
//! small capability surface for sending, editing, and deleting messages
//! and fetching file bytes. The Telegram Bot API implementation lives in
//! [`telegram`]; tests substitute their own.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::job::AudioDescriptor;

pub mod telegram;

pub use telegram::TelegramTransport;

/// Hard ceiling on outbound message length, in characters.
///
/// Matches Telegram's message limit; transcriptions longer than this are
/// split across messages.
pub const MESSAGE_SIZE_LIMIT: usize = 4096;

/// Capability surface the pipeline needs from the chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Download the file behind `file_id` to `dest`.
    async fn fetch_file(&self, file_id: &str, dest: &Path) -> Result<()>;

    /// Send a message, optionally as a reply. Returns the new message's id.
    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<i64>;

    /// Replace the text of an existing message.
    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    /// Delete a message. Callers treat failures as best-effort.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}

/// One inbound chat message, already reduced to what the bot cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub chat_id: i64,
    pub message_id: i64,
    /// Text content, present for commands.
    pub text: Option<String>,
    /// Attached audio, if the message carried any.
    pub audio: Option<AudioDescriptor>,
}
