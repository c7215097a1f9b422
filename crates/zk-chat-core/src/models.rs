//! Core data models for notes, chunks, and retrieval results.
//!
//! These types flow through the indexing and retrieval pipeline:
//!
//! ```text
//! ZkDocument ──split──▶ VectorDocumentForStorage ──store──▶ vector DB
//!                                                              │
//! QueryResult { DocumentChunk, distance } ◀──────query─────────┘
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::metadata::{MetaValue, Metadata};

/// Metadata key holding the owning document id on stored chunks.
pub const CHUNK_META_ID: &str = "id";
/// Metadata key holding the owning document title on stored chunks.
pub const CHUNK_META_TITLE: &str = "title";

/// A Markdown note in the vault.
///
/// The document id is its path relative to the vault root. Documents are
/// never cached; each read reflects what is currently on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkDocument {
    pub relative_path: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub content: String,
}

impl ZkDocument {
    pub fn new(relative_path: impl Into<String>, metadata: Metadata, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            metadata,
            content: content.into(),
        }
    }

    /// Document identity: the relative path.
    pub fn id(&self) -> &str {
        &self.relative_path
    }

    /// Display title.
    ///
    /// Resolution order: a string `title` in metadata, the first Markdown
    /// heading in the body, then the file name without its extension.
    pub fn title(&self) -> String {
        if let Some(title) = self.metadata.get("title").and_then(MetaValue::as_str) {
            if !title.trim().is_empty() {
                return title.trim().to_string();
            }
        }

        if let Some(heading) = first_heading(&self.content) {
            return heading;
        }

        file_stem(&self.relative_path)
    }
}

fn first_heading(content: &str) -> Option<String> {
    let mut in_fence = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&hashes) {
            let rest = &trimmed[hashes..];
            if rest.starts_with(' ') || rest.starts_with('\t') {
                let text = rest.trim().trim_end_matches('#').trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}

fn file_stem(relative_path: &str) -> String {
    let name = relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[..pos].to_string(),
        _ => name.to_string(),
    }
}

/// A slice of a document's text, reconstructed from a stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub document_id: String,
    pub document_title: String,
    pub text: String,
}

/// The unit persisted in the vector store.
///
/// The id is a pure function of the text, so identical text anywhere in the
/// vault collapses to one record and re-indexing unchanged text overwrites
/// in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocumentForStorage {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

impl VectorDocumentForStorage {
    /// Build a storage record for one chunk of `document`.
    pub fn for_chunk(document: &ZkDocument, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut metadata = Metadata::new();
        metadata.insert(CHUNK_META_ID.to_string(), document.id().into());
        metadata.insert(CHUNK_META_TITLE.to_string(), document.title().into());
        Self {
            id: content_id(&text),
            content: text,
            metadata,
        }
    }
}

impl VectorDocumentForStorage {
    /// Build the whole-note record of `document`, keyed by its relative path
    /// so re-indexing a note replaces its previous record.
    pub fn for_document(document: &ZkDocument) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(CHUNK_META_ID.to_string(), document.id().into());
        metadata.insert(CHUNK_META_TITLE.to_string(), document.title().into());
        Self {
            id: document.id().to_string(),
            content: document.content.clone(),
            metadata,
        }
    }
}

/// Content-derived storage id: hex SHA-256 of the text.
pub fn content_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A stored record returned by the vector database with its distance.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQueryResult {
    pub document: VectorDocumentForStorage,
    pub distance: f32,
}

/// A retrieval hit mapped back to its source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub chunk: DocumentChunk,
    pub distance: f32,
}

/// A whole-note retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentQueryResult {
    pub document_id: String,
    pub document_title: String,
    pub distance: f32,
}
