//! Routes Telegram updates to the dialogue engine and commands.

use crate::state::AppState;
use crate::telegram::{Message, Update};
use artrash_core::Transport;
use artrash_types::{ChoiceEvent, InboundImage};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What an update asks us to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Image(InboundImage),
    Choice(ChoiceEvent),
    Quit { chat_id: i64 },
    Dump { chat_id: i64 },
    /// Not an image, not a command, not a known tap. Silently dropped.
    Ignore,
}

/// Decide what an update means. Pure; the async work happens in
/// `handle_update`.
pub fn classify_update(update: &Update) -> Inbound {
    if let Some(message) = &update.message {
        if let Some(text) = &message.text {
            let command = text.split_whitespace().next().unwrap_or("");
            match command.split('@').next().unwrap_or("") {
                "/quit" => return Inbound::Quit { chat_id: message.chat.id },
                "/dump" => return Inbound::Dump { chat_id: message.chat.id },
                _ => {}
            }
        }
        if let Some(image) = extract_image(message) {
            return Inbound::Image(image);
        }
        return Inbound::Ignore;
    }

    if let Some(cb) = &update.callback_query {
        let (Some(prompt), Some(data)) = (&cb.message, &cb.data) else {
            return Inbound::Ignore;
        };
        let Ok(action) = data.parse() else {
            debug!(target: "artrash::update", data = %data, "Unknown callback data");
            return Inbound::Ignore;
        };
        return Inbound::Choice(ChoiceEvent {
            chat_id: prompt.chat.id,
            user_id: cb.from.id,
            prompt_msg_id: prompt.message_id,
            callback_id: cb.id.clone(),
            action,
        });
    }

    Inbound::Ignore
}

/// Pull an image reference out of a message, if it carries one.
///
/// Photos always count (Telegram re-encodes them as JPEG); documents only
/// when their declared mime type matches `image/<something>`.
fn extract_image(message: &Message) -> Option<InboundImage> {
    let user_id = message.from.as_ref()?.id;

    if let Some(document) = &message.document {
        let mime = document.mime_type.as_deref()?;
        if !is_image_mime(mime) {
            return None;
        }
        return Some(InboundImage {
            chat_id: message.chat.id,
            user_id,
            msg_id: message.message_id,
            file_id: document.file_id.clone(),
            mime_type: mime.to_string(),
        });
    }

    // Prefer the third photo size like the original client did; small
    // photos come with fewer sizes, so fall back to the largest.
    let photo = message.photo.get(2).or_else(|| message.photo.last())?;
    Some(InboundImage {
        chat_id: message.chat.id,
        user_id,
        msg_id: message.message_id,
        file_id: photo.file_id.clone(),
        mime_type: "image/jpeg".to_string(),
    })
}

fn is_image_mime(mime: &str) -> bool {
    mime.strip_prefix("image/").is_some_and(|rest| !rest.is_empty())
}

/// Apply one update. Never fails the process; every error is scoped to
/// this update and logged.
pub async fn handle_update(state: Arc<AppState>, update: Update) {
    let update_id = update.update_id;
    match classify_update(&update) {
        Inbound::Image(image) => {
            let chat_id = image.chat_id;
            if let Err(e) = state.engine.handle_image(image).await {
                error!(target: "artrash::update", update_id, chat_id, error = %e, "Image handling failed");
            }
        }
        Inbound::Choice(event) => {
            let chat_id = event.chat_id;
            if let Err(e) = state.engine.handle_choice(event).await {
                error!(target: "artrash::update", update_id, chat_id, error = %e, "Choice handling failed");
            }
        }
        Inbound::Quit { chat_id } => {
            info!(target: "artrash::update", chat_id, "Leaving chat on /quit");
            if let Err(e) = state.transport.leave_chat(chat_id).await {
                error!(target: "artrash::update", update_id, chat_id, error = %e, "leaveChat failed");
            }
        }
        Inbound::Dump { chat_id } => {
            if let Err(e) = run_export(&state, chat_id).await {
                error!(target: "artrash::update", update_id, chat_id, error = %e, "Export failed");
                if let Err(e) = state
                    .transport
                    .send_message(chat_id, "Could not build the archive")
                    .await
                {
                    error!(target: "artrash::update", update_id, chat_id, error = %e, "Failure notice failed");
                }
            }
        }
        Inbound::Ignore => {
            debug!(target: "artrash::update", update_id, "Ignoring update");
        }
    }
}

async fn run_export(state: &AppState, chat_id: i64) -> artrash_core::Result<()> {
    let archive = state.exporter.export().await?;
    let caption = if archive.skipped > 0 {
        format!("{} images ({} skipped)", archive.entry_count, archive.skipped)
    } else {
        format!("{} images", archive.entry_count)
    };
    state
        .transport
        .send_document(chat_id, &archive.file_name, archive.bytes, &caption)
        .await
}
