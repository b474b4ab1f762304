//! On-demand export of every recorded image as a zip bundle.

use crate::{hash::hex_digest, ArtrashError, PredictionStore, Result, Transport};
use artrash_types::{FetchedFile, Prediction};
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// A finished export bundle. Never persisted; produced and sent once.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// `artrash-<sha256-of-bytes>.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entries written into the archive.
    pub entry_count: usize,
    /// Records left out: failed downloads plus records with no verdict.
    pub skipped: usize,
}

/// Builds the export bundle: lists every record, re-fetches the image
/// bytes with bounded concurrency, partitions by verdict into `art/` and
/// `trash/` entries, and names the zip by the hash of its own bytes.
pub struct ArchiveBuilder<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    max_concurrent: usize,
}

impl<T, S> ArchiveBuilder<T, S>
where
    T: Transport,
    S: PredictionStore,
{
    /// `max_concurrent` bounds the download fan-out; values below 1 are
    /// clamped to 1.
    pub fn new(transport: Arc<T>, store: Arc<S>, max_concurrent: usize) -> Self {
        Self {
            transport,
            store,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Assemble the bundle. A single failed re-fetch is skipped and
    /// counted, never fatal; every fetch completes before the zip is
    /// written.
    pub async fn export(&self) -> Result<ExportArchive> {
        let records = self.store.list()?;
        let total = records.len();
        info!(target: "artrash::export", records = total, "Starting export");

        let fetched: Vec<(Prediction, Option<FetchedFile>)> =
            futures::stream::iter(records.into_iter().map(|record| {
                let transport = Arc::clone(&self.transport);
                async move {
                    if record.is_art.is_none() {
                        warn!(
                            target: "artrash::export",
                            hash = %record.content_hash,
                            "Record has no verdict; leaving it out"
                        );
                        return (record, None);
                    }
                    match transport.download_file(&record.file_id).await {
                        Ok(file) => (record, Some(file)),
                        Err(e) => {
                            warn!(
                                target: "artrash::export",
                                hash = %record.content_hash,
                                error = %e,
                                "Download failed; leaving the record out"
                            );
                            (record, None)
                        }
                    }
                }
            }))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut skipped = 0usize;
        for (record, file) in fetched {
            let Some(file) = file else {
                skipped += 1;
                continue;
            };
            let group = if record.is_art == Some(true) { "art" } else { "trash" };
            let ext = file.extension().unwrap_or_else(|| "jpg".to_string());
            entries.push((format!("{group}/{}.{ext}", record.content_hash), file.bytes));
        }

        // The same image recorded by several users lands on the same
        // entry name with identical bytes; keep one.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);

        let bytes = write_zip(&entries)?;
        let file_name = format!("artrash-{}.zip", hex_digest(&bytes));
        info!(
            target: "artrash::export",
            entries = entries.len(),
            skipped,
            size = bytes.len(),
            file_name = %file_name,
            "Export assembled"
        );

        Ok(ExportArchive {
            file_name,
            entry_count: entries.len(),
            skipped,
            bytes,
        })
    }
}

fn write_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| ArtrashError::Archive(e.to_string()))?;
        writer.write_all(bytes)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ArtrashError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
