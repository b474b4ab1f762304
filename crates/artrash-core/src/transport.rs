//! The narrow interface the core needs from the chat transport.

use crate::Result;
use artrash_types::FetchedFile;

/// One button on a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown on the button.
    pub text: String,
    /// Opaque payload echoed back in the tap event.
    pub data: String,
}

impl Choice {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Chat transport collaborator.
///
/// Every call is a single request/response that may fail; nothing is
/// retried here. Implementations live outside the core (the Telegram
/// binding in the bot crate, recording fakes in tests).
pub trait Transport: Send + Sync {
    /// Re-fetch the raw bytes behind a transport file reference.
    fn download_file(&self, file_id: &str) -> impl Future<Output = Result<FetchedFile>> + Send;

    /// Send a plain text message. Returns the new message id.
    fn send_message(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Send a formatted (MarkdownV2) message. Returns the new message id.
    fn send_markdown(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Send a message with an inline button row. Returns the prompt's
    /// message id, needed to retract it later.
    fn send_choice_prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Retract a previously sent message.
    fn delete_message(&self, chat_id: i64, message_id: i64) -> impl Future<Output = Result<()>> + Send;

    /// Acknowledge a button tap, optionally with a short notice.
    fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Upload a document to a chat.
    fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Leave a chat.
    fn leave_chat(&self, chat_id: i64) -> impl Future<Output = Result<()>> + Send;
}
