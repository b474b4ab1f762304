//! The durable feedback record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's recorded verdict on one image.
///
/// At most one record exists per `(user_id, content_hash)` pair. A record
/// without an `id` has not been inserted yet and lives only inside an open
/// dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Store-assigned identity; `None` until the first successful insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Chat the image arrived in.
    pub chat_id: i64,
    /// User the verdict belongs to.
    pub user_id: i64,
    /// Message that carried the image.
    pub msg_id: i64,
    /// Transport file reference, used to re-fetch the bytes for export.
    pub file_id: String,
    /// Hex sha256 of the raw image bytes; the content address.
    pub content_hash: String,
    /// `None` while the dialogue is pending, then the user's verdict.
    pub is_art: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Prediction {
    /// Build an in-flight candidate record for a freshly classified image.
    pub fn candidate(chat_id: i64, user_id: i64, msg_id: i64, file_id: String, content_hash: String) -> Self {
        Self {
            id: None,
            chat_id,
            user_id,
            msg_id,
            file_id,
            content_hash,
            is_art: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the record has been persisted.
    pub fn is_durable(&self) -> bool {
        self.id.is_some()
    }
}
