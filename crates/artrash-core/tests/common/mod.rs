//! Recording fakes for the transport, classifier and store collaborators.

use artrash_core::{ArtrashError, Choice, Classify, PredictionStore, Result, Transport};
use artrash_types::{Classification, Confidence, FetchedFile, Prediction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A sent choice prompt, as the fake transport recorded it.
#[derive(Debug, Clone)]
pub struct SentPrompt {
    pub chat_id: i64,
    pub text: String,
    pub choices: Vec<Choice>,
    pub msg_id: i64,
}

/// Transport fake that records every call and serves canned files.
#[derive(Default)]
pub struct FakeTransport {
    next_msg_id: AtomicI64,
    pub messages: Mutex<Vec<(i64, String)>>,
    pub prompts: Mutex<Vec<SentPrompt>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    pub callbacks: Mutex<Vec<(String, Option<String>)>>,
    pub documents: Mutex<Vec<(i64, String, usize, String)>>,
    files: Mutex<HashMap<String, FetchedFile>>,
    pub fail_downloads: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes served for a file id.
    pub fn serve_file(&self, file_id: &str, bytes: Vec<u8>, path: Option<&str>) {
        self.files.lock().unwrap().insert(
            file_id.to_string(),
            FetchedFile {
                bytes,
                path: path.map(str::to_string),
            },
        );
    }

    pub fn last_prompt(&self) -> SentPrompt {
        self.prompts.lock().unwrap().last().cloned().expect("no prompt sent")
    }

    pub fn last_callback_text(&self) -> Option<String> {
        self.callbacks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no callback answered")
            .1
    }

    pub fn was_deleted(&self, chat_id: i64, msg_id: i64) -> bool {
        self.deleted.lock().unwrap().contains(&(chat_id, msg_id))
    }
}

impl Transport for FakeTransport {
    async fn download_file(&self, file_id: &str) -> Result<FetchedFile> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(ArtrashError::Transport("download refused".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| ArtrashError::Transport(format!("no such file: {file_id}")))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let id = self.next_msg_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.messages.lock().unwrap().push((chat_id, text.to_string()));
        Ok(id)
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text).await
    }

    async fn send_choice_prompt(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<i64> {
        let id = self.next_msg_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(SentPrompt {
            chat_id,
            text: text.to_string(),
            choices: choices.to_vec(),
            msg_id: id,
        });
        Ok(id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.callbacks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        self.documents.lock().unwrap().push((
            chat_id,
            file_name.to_string(),
            bytes.len(),
            caption.to_string(),
        ));
        Ok(())
    }

    async fn leave_chat(&self, _chat_id: i64) -> Result<()> {
        Ok(())
    }
}

/// Classifier fake with a fixed answer and a failure switch.
pub struct StubClassifier {
    result: Classification,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubClassifier {
    pub fn junk() -> Self {
        Self {
            result: Classification {
                label: "junk".to_string(),
                confidences: vec![
                    Confidence {
                        label: "junk".to_string(),
                        confidence: 0.91,
                    },
                    Confidence {
                        label: "modern conceptual art".to_string(),
                        confidence: 0.09,
                    },
                ],
            },
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classify for StubClassifier {
    async fn classify(&self, _bytes: &[u8], _mime_type: &str) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ArtrashError::Classifier("stubbed outage".to_string()));
        }
        Ok(self.result.clone())
    }
}

/// In-memory prediction store with per-operation failure switches.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Prediction>>,
    next_id: AtomicI64,
    pub fail_insert: AtomicBool,
    pub fail_update: AtomicBool,
    pub updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Prediction> {
        self.rows.lock().unwrap().clone()
    }

    /// Seed a durable record directly, as if inserted earlier.
    pub fn seed(&self, mut prediction: Prediction) -> Prediction {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        prediction.id = Some(id);
        let now = chrono::Utc::now();
        prediction.created_at = Some(now);
        prediction.updated_at = Some(now);
        self.rows.lock().unwrap().push(prediction.clone());
        prediction
    }
}

impl PredictionStore for MemoryStore {
    fn find(&self, user_id: i64, content_hash: &str) -> Result<Option<Prediction>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.content_hash == content_hash)
            .cloned())
    }

    fn insert(&self, prediction: &Prediction) -> Result<Prediction> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(ArtrashError::Store("insert refused".to_string()));
        }
        Ok(self.seed(prediction.clone()))
    }

    fn update_verdict(&self, id: i64, is_art: bool) -> Result<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ArtrashError::Store("update refused".to_string()));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| p.id == Some(id))
            .ok_or(ArtrashError::PredictionNotFound(id))?;
        row.is_art = Some(is_art);
        row.updated_at = Some(chrono::Utc::now());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Prediction>> {
        Ok(self.rows())
    }
}
