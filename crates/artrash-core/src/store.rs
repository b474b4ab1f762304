//! SQLite persistence for prediction records.

use crate::{ArtrashError, Result};
use artrash_types::Prediction;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Prediction store collaborator.
///
/// The adapter does not enforce the one-record-per-`(user, hash)`
/// invariant; the dialogue engine's find-before-insert does. `find`
/// returns `None` for absent records, never an error.
pub trait PredictionStore: Send + Sync {
    /// Exact lookup by user and content hash.
    fn find(&self, user_id: i64, content_hash: &str) -> Result<Option<Prediction>>;

    /// Insert a new record; returns the stored copy with id and
    /// timestamps filled in.
    fn insert(&self, prediction: &Prediction) -> Result<Prediction>;

    /// Set the verdict on an existing record and refresh `updated_at`.
    /// An unknown id is an error, not a no-op.
    fn update_verdict(&self, id: i64, is_art: bool) -> Result<()>;

    /// All records, unpaginated. Export only.
    fn list(&self) -> Result<Vec<Prediction>>;
}

/// SQLite-backed prediction store.
pub struct SqlitePredictionStore {
    conn: Mutex<Connection>,
}

impl SqlitePredictionStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                msg_id INTEGER NOT NULL,
                file_id TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                is_art INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_predictions_user_hash
                ON predictions(user_id, content_hash);
            "#,
        )?;
        Ok(())
    }

    fn row_to_prediction(row: &rusqlite::Row) -> rusqlite::Result<Prediction> {
        let is_art: Option<i64> = row.get("is_art")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Prediction {
            id: Some(row.get("id")?),
            chat_id: row.get("chat_id")?,
            user_id: row.get("user_id")?,
            msg_id: row.get("msg_id")?,
            file_id: row.get("file_id")?,
            content_hash: row.get("content_hash")?,
            is_art: is_art.map(|v| v != 0),
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .ok(),
            updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .ok(),
        })
    }
}

impl PredictionStore for SqlitePredictionStore {
    fn find(&self, user_id: i64, content_hash: &str) -> Result<Option<Prediction>> {
        let conn = self.conn.lock().unwrap();
        let prediction = conn
            .query_row(
                "SELECT * FROM predictions WHERE user_id = ?1 AND content_hash = ?2",
                params![user_id, content_hash],
                |row| Self::row_to_prediction(row),
            )
            .optional()?;
        Ok(prediction)
    }

    fn insert(&self, prediction: &Prediction) -> Result<Prediction> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now();
        conn.execute(
            r#"
            INSERT INTO predictions (
                chat_id, user_id, msg_id, file_id, content_hash, is_art,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                prediction.chat_id,
                prediction.user_id,
                prediction.msg_id,
                prediction.file_id,
                prediction.content_hash,
                prediction.is_art.map(|v| v as i64),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        let mut stored = prediction.clone();
        stored.id = Some(conn.last_insert_rowid());
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        Ok(stored)
    }

    fn update_verdict(&self, id: i64, is_art: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE predictions SET is_art = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_art as i64, chrono::Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(ArtrashError::PredictionNotFound(id));
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Prediction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM predictions ORDER BY created_at ASC")?;
        let predictions = stmt
            .query_map([], |row| Self::row_to_prediction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(predictions)
    }
}
