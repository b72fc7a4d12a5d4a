//! Fixed-window text splitter.
//!
//! Splits text greedily into windows of at most `max_chunk_size` characters
//! with no awareness of sentence or paragraph boundaries. Concatenating the
//! windows in order reproduces the input exactly, whitespace included.
//!
//! Lengths are counted in Unicode scalar values, so a window never cuts a
//! multi-byte character in half.
//!
//! Each chunk gets a deterministic record id derived from its document id
//! and index, so rebuilding a document overwrites its vectors in place.

use sha2::{Digest, Sha256};

use crate::error::{RagError, Result};
use crate::models::{Chunk, Document};

/// Split `text` into ordered windows of at most `max_chunk_size` chars.
///
/// Empty input yields no chunks. A `max_chunk_size` of zero is rejected.
pub fn split(text: &str, max_chunk_size: usize) -> Result<Vec<String>> {
    if max_chunk_size == 0 {
        return Err(RagError::validation("max chunk size must be > 0"));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == max_chunk_size {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    Ok(chunks)
}

/// Split a document's content into [`Chunk`]s with contiguous indices from 0.
pub fn chunk_document(document: &Document, max_chunk_size: usize) -> Result<Vec<Chunk>> {
    let chunks = split(&document.content, max_chunk_size)?
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            id: record_id(&document.id, index),
            document_id: document.id.clone(),
            chunk_index: index,
            text,
        })
        .collect();
    Ok(chunks)
}

/// Stable vector-record id for chunk `index` of `document_id`.
///
/// First 32 hex chars of `SHA-256(document_id ‖ 0x00 ‖ index)`.
pub fn record_id(document_id: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(index.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_string()
}
