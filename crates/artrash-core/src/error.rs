//! Error types for artrash.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtrashError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Prediction not found: {0}")]
    PredictionNotFound(i64),

    #[error("Empty payload: cannot hash zero bytes")]
    EmptyPayload,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
