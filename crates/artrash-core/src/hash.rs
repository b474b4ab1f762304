//! Content addressing for image payloads.

use crate::{ArtrashError, Result};
use sha2::{Digest, Sha256};

/// Hex sha256 of a byte payload.
///
/// This is the dedup key for `(user, image)` pairs and the self-naming
/// scheme for export archives. Empty input is the one rejected case.
pub fn content_hash(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(ArtrashError::EmptyPayload);
    }
    Ok(hex_digest(bytes))
}

/// Hex sha256 without the empty-input guard, for payloads we produced
/// ourselves (the archive bytes).
pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
