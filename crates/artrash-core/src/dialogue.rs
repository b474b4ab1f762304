//! The feedback dialogue state machine.
//!
//! One image message opens at most one dialogue per chat: the image is
//! classified, the verdict is shown, and a choice prompt asks the user to
//! either file a fresh verdict (Art/Trash) or revise an existing one
//! (Yes/No). A later button tap resolves the dialogue with exactly one
//! store mutation, or none. Insert is only reachable from the fresh
//! branch and update only from the revision branch, which is what keeps
//! `(user, content_hash)` unique without store-side constraints.

use crate::{hash::content_hash, Choice, Classify, PredictionStore, Result, Transport};
use artrash_types::{
    label_emoji, verdict_emoji, ChoiceAction, ChoiceEvent, Classification, InboundImage, Prediction,
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the open prompt lives, so it can be retracted on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLocation {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Which branch the dialogue is in, with its candidate record.
#[derive(Debug, Clone)]
enum DialogueState {
    /// No prior record for this `(user, hash)`; the candidate has no id
    /// and becomes durable only on an Art/Trash tap.
    ClassifiedNew { candidate: Prediction },
    /// A record already exists; Yes flips its verdict, No leaves it.
    ClassifiedExisting { record: Prediction },
}

/// One chat's pending interaction.
#[derive(Debug, Clone)]
pub struct Dialogue {
    state: DialogueState,
    prompt: PromptLocation,
}

/// The per-interaction state machine.
///
/// Holds the only shared mutable state in the process: a map from chat id
/// to its open dialogue. Slot changes go through atomic map operations
/// (`insert`, `remove`, `entry`), so two updates racing on the same chat
/// resolve to one winner instead of interleaved half-states.
pub struct DialogueEngine<T, C, S> {
    transport: Arc<T>,
    classifier: Arc<C>,
    store: Arc<S>,
    dialogues: DashMap<i64, Dialogue>,
}

impl<T, C, S> DialogueEngine<T, C, S>
where
    T: Transport,
    C: Classify,
    S: PredictionStore,
{
    pub fn new(transport: Arc<T>, classifier: Arc<C>, store: Arc<S>) -> Self {
        Self {
            transport,
            classifier,
            store,
            dialogues: DashMap::new(),
        }
    }

    /// Number of currently open dialogues.
    pub fn open_dialogues(&self) -> usize {
        self.dialogues.len()
    }

    /// Handle an inbound image: download, hash, classify, dedup-check,
    /// and open the matching dialogue.
    ///
    /// The classification result is always shown, independent of the
    /// dedup outcome. Per-step failures end the interaction with a notice
    /// and never open a dialogue.
    pub async fn handle_image(&self, image: InboundImage) -> Result<()> {
        let file = match self.transport.download_file(&image.file_id).await {
            Ok(file) => file,
            Err(e) => {
                warn!(target: "artrash::dialogue", chat_id = image.chat_id, error = %e, "Image download failed");
                self.transport
                    .send_message(image.chat_id, "Could not fetch that image")
                    .await?;
                return Ok(());
            }
        };

        let hash = match content_hash(&file.bytes) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(target: "artrash::dialogue", chat_id = image.chat_id, error = %e, "Unhashable payload");
                self.transport
                    .send_message(image.chat_id, "Could not fetch that image")
                    .await?;
                return Ok(());
            }
        };

        let classification = match self.classifier.classify(&file.bytes, &image.mime_type).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(target: "artrash::dialogue", chat_id = image.chat_id, error = %e, "Classification failed");
                self.transport
                    .send_message(image.chat_id, "Could not read data")
                    .await?;
                return Ok(());
            }
        };

        self.transport
            .send_markdown(image.chat_id, &render_classification(&classification))
            .await?;

        let existing = match self.store.find(image.user_id, &hash) {
            Ok(existing) => existing,
            Err(e) => {
                warn!(target: "artrash::dialogue", chat_id = image.chat_id, error = %e, "Store lookup failed");
                self.transport
                    .send_message(image.chat_id, "Could not check earlier verdicts")
                    .await?;
                return Ok(());
            }
        };

        let (state, text, choices) = match existing {
            None => {
                debug!(target: "artrash::dialogue", chat_id = image.chat_id, hash = %hash, "Opening fresh dialogue");
                let candidate = Prediction::candidate(
                    image.chat_id,
                    image.user_id,
                    image.msg_id,
                    image.file_id.clone(),
                    hash,
                );
                (
                    DialogueState::ClassifiedNew { candidate },
                    "What do you say?".to_string(),
                    vec![
                        Choice::new(format!("{} Art", label_emoji("modern conceptual art")), ChoiceAction::Art.as_str()),
                        Choice::new(format!("{} Trash", label_emoji("junk")), ChoiceAction::Trash.as_str()),
                    ],
                )
            }
            Some(record) => {
                debug!(target: "artrash::dialogue", chat_id = image.chat_id, hash = %hash, "Opening mind-change dialogue");
                let verdict = verdict_emoji(record.is_art.unwrap_or(false));
                (
                    DialogueState::ClassifiedExisting { record },
                    format!("You already filed this under {verdict} — did you change your mind?"),
                    vec![
                        Choice::new("Yes", ChoiceAction::Yes.as_str()),
                        Choice::new("No", ChoiceAction::No.as_str()),
                    ],
                )
            }
        };

        let prompt_msg_id = self
            .transport
            .send_choice_prompt(image.chat_id, &text, &choices)
            .await?;

        let dialogue = Dialogue {
            state,
            prompt: PromptLocation {
                chat_id: image.chat_id,
                message_id: prompt_msg_id,
            },
        };

        // A newer image replaces the chat's open dialogue; retract the
        // orphaned prompt instead of leaving it live.
        if let Some(previous) = self.dialogues.insert(image.chat_id, dialogue) {
            info!(
                target: "artrash::dialogue",
                chat_id = image.chat_id,
                "Replacing an open dialogue; retracting its prompt"
            );
            if let Err(e) = self
                .transport
                .delete_message(previous.prompt.chat_id, previous.prompt.message_id)
                .await
            {
                warn!(target: "artrash::dialogue", chat_id = image.chat_id, error = %e, "Could not retract stale prompt");
            }
        }

        Ok(())
    }

    /// Resolve a button tap against the chat's open dialogue.
    ///
    /// The slot is claimed atomically up front; on a store failure it is
    /// put back (unless a newer dialogue took the chat meanwhile), so the
    /// same tap can be retried against the still-visible prompt.
    pub async fn handle_choice(&self, event: ChoiceEvent) -> Result<()> {
        let Some((_, dialogue)) = self.dialogues.remove(&event.chat_id) else {
            debug!(target: "artrash::dialogue", chat_id = event.chat_id, "Tap without an open dialogue");
            return self
                .transport
                .answer_callback(&event.callback_id, Some("This prompt is no longer active"))
                .await;
        };

        if dialogue.prompt.message_id != event.prompt_msg_id {
            self.restore(event.chat_id, dialogue);
            return self
                .transport
                .answer_callback(&event.callback_id, Some("This prompt is no longer active"))
                .await;
        }

        if self.dialogue_owner(&dialogue) != event.user_id {
            self.restore(event.chat_id, dialogue);
            return self
                .transport
                .answer_callback(&event.callback_id, Some("This one is not yours to judge"))
                .await;
        }

        match (&dialogue.state, event.action) {
            (DialogueState::ClassifiedNew { candidate }, ChoiceAction::Art | ChoiceAction::Trash) => {
                let is_art = event.action == ChoiceAction::Art;
                let mut verdict = candidate.clone();
                verdict.is_art = Some(is_art);

                match self.store.insert(&verdict) {
                    Ok(stored) => {
                        info!(
                            target: "artrash::dialogue",
                            chat_id = event.chat_id,
                            user_id = event.user_id,
                            id = stored.id,
                            is_art,
                            "Verdict recorded"
                        );
                        self.retract_prompt(&dialogue.prompt).await;
                        self.transport
                            .answer_callback(
                                &event.callback_id,
                                Some(&format!("Saved {}", verdict_emoji(is_art))),
                            )
                            .await?;
                    }
                    Err(e) => {
                        warn!(target: "artrash::dialogue", chat_id = event.chat_id, error = %e, "Insert failed");
                        self.restore(event.chat_id, dialogue);
                        self.transport
                            .answer_callback(&event.callback_id, Some("Could not save your verdict"))
                            .await?;
                    }
                }
            }

            (DialogueState::ClassifiedExisting { .. }, ChoiceAction::No) => {
                self.retract_prompt(&dialogue.prompt).await;
                self.transport
                    .answer_callback(&event.callback_id, Some("Nothing changed"))
                    .await?;
            }

            (DialogueState::ClassifiedExisting { record }, ChoiceAction::Yes) => {
                let flipped = !record.is_art.unwrap_or(false);
                // `find` only hands out durable records, so the id is
                // present; guard anyway rather than unwrap.
                let result = record
                    .id
                    .ok_or(crate::ArtrashError::PredictionNotFound(0))
                    .and_then(|id| self.store.update_verdict(id, flipped));
                match result {
                    Ok(()) => {
                        info!(
                            target: "artrash::dialogue",
                            chat_id = event.chat_id,
                            user_id = event.user_id,
                            id = record.id,
                            is_art = flipped,
                            "Verdict revised"
                        );
                        self.retract_prompt(&dialogue.prompt).await;
                        self.transport
                            .answer_callback(
                                &event.callback_id,
                                Some(&format!("Updated to {}", verdict_emoji(flipped))),
                            )
                            .await?;
                    }
                    Err(e) => {
                        warn!(target: "artrash::dialogue", chat_id = event.chat_id, error = %e, "Update failed");
                        self.restore(event.chat_id, dialogue);
                        self.transport
                            .answer_callback(&event.callback_id, Some("Could not update your verdict"))
                            .await?;
                    }
                }
            }

            // A tap that does not belong to the current branch: stale
            // callback data from a retracted prompt.
            (_, action) => {
                debug!(target: "artrash::dialogue", chat_id = event.chat_id, ?action, "Tap does not match dialogue state");
                self.restore(event.chat_id, dialogue);
                self.transport
                    .answer_callback(&event.callback_id, Some("This prompt is no longer active"))
                    .await?;
            }
        }

        Ok(())
    }

    fn dialogue_owner(&self, dialogue: &Dialogue) -> i64 {
        match &dialogue.state {
            DialogueState::ClassifiedNew { candidate } => candidate.user_id,
            DialogueState::ClassifiedExisting { record } => record.user_id,
        }
    }

    /// Put a claimed dialogue back, unless a newer one took the slot.
    fn restore(&self, chat_id: i64, dialogue: Dialogue) {
        self.dialogues.entry(chat_id).or_insert(dialogue);
    }

    /// Best-effort removal of a resolved prompt.
    async fn retract_prompt(&self, prompt: &PromptLocation) {
        if let Err(e) = self
            .transport
            .delete_message(prompt.chat_id, prompt.message_id)
            .await
        {
            warn!(target: "artrash::dialogue", chat_id = prompt.chat_id, error = %e, "Could not retract prompt");
        }
    }
}

/// Render the classifier verdict with its confidence breakdown, escaped
/// for MarkdownV2.
fn render_classification(classification: &Classification) -> String {
    let mut message = format!("This is *{}*\n", escape_markdown(&classification.label));
    message.push_str("\nConfidences:\n");
    let lines: Vec<String> = classification
        .confidences
        .iter()
        .map(|item| {
            format!(
                "{} {} %",
                label_emoji(&item.label),
                escape_markdown(&format!("{:.2}", item.confidence * 100.0))
            )
        })
        .collect();
    message.push_str(&lines.join("\n"));
    message
}

/// Escape the MarkdownV2 reserved characters.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
                | '|' | '{' | '}' | '.' | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
