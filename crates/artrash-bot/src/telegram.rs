//! Telegram Bot API binding.
//!
//! Implements the core's `Transport` trait over the HTTP Bot API and
//! exposes `get_updates` long polling for the main loop. Only the handful
//! of methods the bot uses are bound.

use artrash_core::{ArtrashError, Choice, Result, Transport};
use artrash_types::FetchedFile;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// An element of the getUpdates stream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: ChatRef,
    pub from: Option<UserRef>,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: i64,
}

/// One resolution of a photo attachment; Telegram sends several.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: UserRef,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// getFile result; `file_path` feeds the file download URL.
#[derive(Debug, Clone, Deserialize)]
struct FileRef {
    file_path: Option<String>,
}

/// Every Bot API response: `{ ok, result }` or `{ ok: false, description }`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Bot API client.
pub struct TelegramTransport {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: api_base.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    /// One Bot API call: POST JSON, unwrap the `{ ok, result }` envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &serde_json::Value) -> Result<T> {
        debug!(target: "artrash::transport", method, "Bot API call");
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ArtrashError::Transport(format!("{method} request failed: {e}")))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ArtrashError::Transport(format!("{method} response malformed: {e}")))?;

        if !envelope.ok {
            let why = envelope.description.unwrap_or_else(|| "no description".to_string());
            return Err(ArtrashError::Transport(format!("{method} refused: {why}")));
        }
        envelope
            .result
            .ok_or_else(|| ArtrashError::Transport(format!("{method} returned no result")))
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

impl Transport for TelegramTransport {
    async fn download_file(&self, file_id: &str) -> Result<FetchedFile> {
        let file: FileRef = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let path = file
            .file_path
            .ok_or_else(|| ArtrashError::Transport("getFile returned no file_path".to_string()))?;

        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| ArtrashError::Transport(format!("file download failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ArtrashError::Transport(format!(
                "file download returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArtrashError::Transport(format!("file download failed: {e}")))?;

        Ok(FetchedFile {
            bytes: bytes.to_vec(),
            path: Some(path),
        })
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let message: Message = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(message.message_id)
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<i64> {
        let message: Message = self
            .call(
                "sendMessage",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "MarkdownV2",
                }),
            )
            .await?;
        Ok(message.message_id)
    }

    async fn send_choice_prompt(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<i64> {
        let row: Vec<serde_json::Value> = choices
            .iter()
            .map(|c| serde_json::json!({ "text": c.text, "callback_data": c.data }))
            .collect();
        let message: Message = self
            .call(
                "sendMessage",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": { "inline_keyboard": [row] },
                }),
            )
            .await?;
        Ok(message.message_id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                &serde_json::json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut body = serde_json::json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = serde_json::Value::String(text.to_string());
        }
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .map_err(|e| ArtrashError::Transport(format!("sendDocument part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ArtrashError::Transport(format!("sendDocument request failed: {e}")))?;

        let envelope: ApiResponse<Message> = response
            .json()
            .await
            .map_err(|e| ArtrashError::Transport(format!("sendDocument response malformed: {e}")))?;
        if !envelope.ok {
            let why = envelope.description.unwrap_or_else(|| "no description".to_string());
            return Err(ArtrashError::Transport(format!("sendDocument refused: {why}")));
        }
        Ok(())
    }

    async fn leave_chat(&self, chat_id: i64) -> Result<()> {
        let _: bool = self
            .call("leaveChat", &serde_json::json!({ "chat_id": chat_id }))
            .await?;
        Ok(())
    }
}
