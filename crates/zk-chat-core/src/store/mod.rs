//! Vector store abstraction for zk-chat.
//!
//! The [`VectorStore`] trait is the contract the rest of the system holds
//! against the underlying vector database: named collections of
//! id/text/metadata/embedding records that can be reset, upserted into,
//! and searched by nearest neighbour.
//!
//! Implementations must be `Send + Sync` to work with async runtimes and
//! must treat [`upsert`](VectorStore::upsert) as overwrite-by-id: adding a
//! record whose id is already stored replaces it rather than duplicating it.

pub mod memory;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::metadata::Metadata;

/// The named collections addressed by zk-chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionName {
    /// Token-window excerpts of every note.
    Excerpts,
    /// Whole-document records.
    Documents,
    /// Free-form notes remembered during chat.
    SmartMemory,
}

impl CollectionName {
    pub const ALL: [CollectionName; 3] = [
        CollectionName::Excerpts,
        CollectionName::Documents,
        CollectionName::SmartMemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Excerpts => "excerpts",
            CollectionName::Documents => "documents",
            CollectionName::SmartMemory => "smart_memory",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as held by the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// A record returned from a nearest-neighbour search.
///
/// The embedding is not returned; callers only need the text and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// Cosine distance to the query vector. Lower is closer.
    pub distance: f32,
}

/// Abstract vector database backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`reset`](VectorStore::reset) | Drop every record in a collection |
/// | [`upsert`](VectorStore::upsert) | Insert or overwrite records by id |
/// | [`query`](VectorStore::query) | Nearest records, ascending distance |
/// | [`count`](VectorStore::count) | Number of records in a collection |
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn reset(&self, collection: CollectionName) -> Result<()>;

    async fn upsert(&self, collection: CollectionName, records: &[StoredVector]) -> Result<()>;

    /// Return at most `n_results` records, closest first.
    async fn query(
        &self,
        collection: CollectionName,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<VectorHit>>;

    async fn count(&self, collection: CollectionName) -> Result<usize>;
}
