//! Core feedback pipeline for artrash: content hashing, classification,
//! the dialogue state machine, prediction persistence, and bulk export.

mod archive;
mod classifier;
mod dialogue;
mod error;
mod hash;
mod store;
mod transport;

pub use archive::{ArchiveBuilder, ExportArchive};
pub use classifier::{Classify, HttpClassifier};
pub use dialogue::DialogueEngine;
pub use error::ArtrashError;
pub use hash::content_hash;
pub use store::{PredictionStore, SqlitePredictionStore};
pub use transport::{Choice, Transport};

/// Result type for artrash operations.
pub type Result<T> = std::result::Result<T, ArtrashError>;
