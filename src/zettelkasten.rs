//! The Zettelkasten engine.
//!
//! Ties the vault on disk to the excerpts collection of the vector
//! database. Notes are read fresh from the filesystem on every call; the
//! engine holds no document cache.
//!
//! # Indexing
//!
//! ```text
//! vault/*.md ─▶ parse front-matter ─▶ encode body ─▶ split into token windows
//!            ─▶ decode each window ─▶ sha256 id + {id, title} ─▶ embed + upsert
//! ```
//!
//! Each note is also stored whole in the documents collection, keyed by
//! its relative path, for note-level search ([`Zettelkasten::query_documents`]).
//!
//! [`Zettelkasten::chunk_and_index`] resets both collections first, so
//! anything removed from the vault disappears from search results.
//! [`Zettelkasten::incremental_chunk_and_index`] only touches notes
//! modified after a watermark and never resets. Both stop at the first
//! failing document and return the error.
//!
//! Every failure is logged on the engine's span with `operation`, `path`
//! and `error_kind` fields before being returned to the caller.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Span;

use zk_chat_core::models::{CHUNK_META_ID, CHUNK_META_TITLE};
use zk_chat_core::splitter::{split_to_chunks, validate_chunking};
use zk_chat_core::tokenizer::Tokenizer;
use zk_chat_core::{
    merge_metadata, DocumentChunk, DocumentQueryResult, MetaValue, Metadata, QueryResult,
    VectorDocumentForStorage, ZkDocument, ZkError, ZkResult,
};

use crate::fs_gateway::MarkdownFilesystemGateway;
use crate::markdown::{parse_markdown, render_markdown};
use crate::vector_db::VectorDatabase;

/// Inserted between the old and new body when appending to a note.
pub const APPEND_SEPARATOR: &str = "\n\n---\n\n";

/// Counts reported by an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Notes that were chunked and stored.
    pub documents_indexed: usize,
    /// Notes left alone because they were not modified since the watermark.
    pub documents_skipped: usize,
    /// Chunk records sent to the vector database.
    pub chunks_stored: usize,
    /// Whole-note records sent to the documents collection.
    pub documents_stored: usize,
}

pub struct Zettelkasten {
    tokenizer: Arc<dyn Tokenizer>,
    excerpts: VectorDatabase,
    documents: VectorDatabase,
    filesystem: MarkdownFilesystemGateway,
    span: Span,
}

impl Zettelkasten {
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        excerpts: VectorDatabase,
        documents: VectorDatabase,
        filesystem: MarkdownFilesystemGateway,
    ) -> Self {
        let span = tracing::info_span!("zettelkasten", vault = %filesystem.root().display());
        Self {
            tokenizer,
            excerpts,
            documents,
            filesystem,
            span,
        }
    }

    /// Replace the span all engine events are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn filesystem(&self) -> &MarkdownFilesystemGateway {
        &self.filesystem
    }

    pub fn document_exists(&self, relative_path: &str) -> bool {
        self.filesystem.path_exists(relative_path)
    }

    pub fn read_document(&self, relative_path: &str) -> ZkResult<ZkDocument> {
        let result = self.load(relative_path);
        self.traced("read_document", relative_path, result)
    }

    /// Write `document` to disk, replacing any existing file.
    pub fn create_or_overwrite_document(&self, document: &ZkDocument) -> ZkResult<()> {
        let result = self.store(document);
        self.traced("create_or_overwrite_document", &document.relative_path, result)?;
        tracing::info!(parent: &self.span, path = %document.relative_path, "document written");
        Ok(())
    }

    pub fn create_or_append_document(&self, document: &ZkDocument) -> ZkResult<()> {
        if self.document_exists(&document.relative_path) {
            self.append_to_document(document)
        } else {
            self.create_or_overwrite_document(document)
        }
    }

    /// Append `document`'s body to the existing note and merge its metadata.
    pub fn append_to_document(&self, document: &ZkDocument) -> ZkResult<()> {
        let path = &document.relative_path;
        let existing = self.traced("append_to_document", path, self.load(path))?;

        let merged = ZkDocument::new(
            path.clone(),
            merge_metadata(&existing.metadata, &document.metadata),
            format!("{}{}{}", existing.content, APPEND_SEPARATOR, document.content),
        );
        self.traced("append_to_document", path, self.store(&merged))?;
        tracing::info!(parent: &self.span, path = %path, "document appended");
        Ok(())
    }

    /// Lazily read every note in the vault. Each call walks the vault anew.
    pub fn iterate_documents(&self) -> impl Iterator<Item = ZkResult<ZkDocument>> + '_ {
        self.filesystem
            .iterate_markdown_files()
            .map(move |entry| entry.and_then(|path| self.read_document(&path)))
    }

    /// `(relative_path, title)` for every note in the vault.
    pub fn list_documents(&self) -> ZkResult<Vec<(String, String)>> {
        self.iterate_documents()
            .map(|document| {
                document.map(|d| {
                    let title = d.title();
                    (d.relative_path, title)
                })
            })
            .collect()
    }

    /// Linear scan for the note whose id is `id`. `Ok(None)` when absent.
    #[deprecated(note = "O(n) scan over the vault; use `read_document` with the relative path")]
    pub fn find_by_id(&self, id: &str) -> ZkResult<Option<ZkDocument>> {
        for document in self.iterate_documents() {
            let document = document?;
            if document.id() == id {
                return Ok(Some(document));
            }
        }
        Ok(None)
    }

    pub fn rename_document(&self, from: &str, to: &str) -> ZkResult<()> {
        let result = self.filesystem.rename_file(from, to);
        self.traced("rename_document", from, result)?;
        tracing::info!(parent: &self.span, from, to, "document renamed");
        Ok(())
    }

    pub fn delete_document(&self, relative_path: &str) -> ZkResult<()> {
        let result = self.filesystem.delete_file(relative_path);
        self.traced("delete_document", relative_path, result)?;
        tracing::info!(parent: &self.span, path = relative_path, "document deleted");
        Ok(())
    }

    /// Full reindex: reset the excerpts and documents collections, then
    /// chunk and store every note.
    pub async fn chunk_and_index(
        &self,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> ZkResult<IndexSummary> {
        self.traced("chunk_and_index", "", validate_chunking(chunk_size, chunk_overlap))?;

        let reset = self.excerpts.reset().await.map_err(ZkError::from);
        self.traced("chunk_and_index", "", reset)?;
        let reset = self.documents.reset().await.map_err(ZkError::from);
        self.traced("chunk_and_index", "", reset)?;
        tracing::info!(
            parent: &self.span,
            chunk_size,
            chunk_overlap,
            collection = %self.excerpts.collection(),
            "full reindex started"
        );

        let mut summary = IndexSummary::default();
        for entry in self.filesystem.iterate_markdown_files() {
            let path = self.traced("chunk_and_index", "", entry)?;
            let document = self.read_document(&path)?;
            self.index_document(&document, chunk_size, chunk_overlap, &mut summary)
                .await?;
        }

        tracing::info!(
            parent: &self.span,
            documents = summary.documents_indexed,
            chunks = summary.chunks_stored,
            notes_stored = summary.documents_stored,
            "full reindex finished"
        );
        Ok(summary)
    }

    /// Re-chunk only notes modified strictly after `since`.
    pub async fn incremental_chunk_and_index(
        &self,
        since: DateTime<Utc>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> ZkResult<IndexSummary> {
        self.traced(
            "incremental_chunk_and_index",
            "",
            validate_chunking(chunk_size, chunk_overlap),
        )?;
        tracing::info!(parent: &self.span, %since, chunk_size, chunk_overlap, "incremental reindex started");

        let mut summary = IndexSummary::default();
        for entry in self.filesystem.iterate_markdown_files() {
            let path = self.traced("incremental_chunk_and_index", "", entry)?;
            let modified = self.filesystem.get_modified_time(&path);
            let modified = self.traced("incremental_chunk_and_index", &path, modified)?;
            if modified <= since {
                summary.documents_skipped += 1;
                continue;
            }

            let document = self.read_document(&path)?;
            self.index_document(&document, chunk_size, chunk_overlap, &mut summary)
                .await?;
        }

        tracing::info!(
            parent: &self.span,
            documents = summary.documents_indexed,
            skipped = summary.documents_skipped,
            chunks = summary.chunks_stored,
            "incremental reindex finished"
        );
        Ok(summary)
    }

    /// Nearest excerpts to `query`, dropping any farther than `max_distance`.
    ///
    /// Order is whatever the vector database returned.
    pub async fn query_chunks(
        &self,
        query: &str,
        n_results: usize,
        max_distance: f32,
    ) -> ZkResult<Vec<QueryResult>> {
        let hits = self.excerpts.query(query, n_results).await.map_err(ZkError::from);
        let hits = self.traced("query_chunks", "", hits)?;

        let results: Vec<QueryResult> = hits
            .into_iter()
            .filter(|hit| hit.distance <= max_distance)
            .map(|hit| QueryResult {
                chunk: DocumentChunk {
                    document_id: meta_string(&hit.document.metadata, CHUNK_META_ID),
                    document_title: meta_string(&hit.document.metadata, CHUNK_META_TITLE),
                    text: hit.document.content,
                },
                distance: hit.distance,
            })
            .collect();

        tracing::debug!(parent: &self.span, n_results, max_distance, returned = results.len(), "query_chunks");
        Ok(results)
    }

    /// Nearest whole notes to `query`, dropping any farther than `max_distance`.
    pub async fn query_documents(
        &self,
        query: &str,
        n_results: usize,
        max_distance: f32,
    ) -> ZkResult<Vec<DocumentQueryResult>> {
        let hits = self.documents.query(query, n_results).await.map_err(ZkError::from);
        let hits = self.traced("query_documents", "", hits)?;

        Ok(hits
            .into_iter()
            .filter(|hit| hit.distance <= max_distance)
            .map(|hit| DocumentQueryResult {
                document_id: meta_string(&hit.document.metadata, CHUNK_META_ID),
                document_title: meta_string(&hit.document.metadata, CHUNK_META_TITLE),
                distance: hit.distance,
            })
            .collect())
    }

    async fn index_document(
        &self,
        document: &ZkDocument,
        chunk_size: usize,
        chunk_overlap: usize,
        summary: &mut IndexSummary,
    ) -> ZkResult<()> {
        summary.chunks_stored += self
            .chunk_document(document, chunk_size, chunk_overlap)
            .await?;
        if self.store_whole_document(document).await? {
            summary.documents_stored += 1;
        }
        summary.documents_indexed += 1;
        Ok(())
    }

    /// Store the note body as one record. Blank notes are skipped.
    async fn store_whole_document(&self, document: &ZkDocument) -> ZkResult<bool> {
        if document.content.trim().is_empty() {
            return Ok(false);
        }
        let record = VectorDocumentForStorage::for_document(document);
        let stored = self.documents.add_documents(&[record]).await.map_err(ZkError::from);
        self.traced("store_whole_document", &document.relative_path, stored)?;
        Ok(true)
    }

    /// Split one note into token windows and store them. Returns the number
    /// of chunks stored; windows that decode to blank text are dropped.
    async fn chunk_document(
        &self,
        document: &ZkDocument,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> ZkResult<usize> {
        let path = document.relative_path.as_str();
        let tokens = self.tokenizer.encode(&document.content);
        let windows = self.traced(
            "chunk_document",
            path,
            split_to_chunks(&tokens, chunk_size, chunk_overlap),
        )?;
        if windows.is_empty() {
            tracing::debug!(parent: &self.span, path, "no chunks; skipped");
            return Ok(0);
        }

        let mut records = Vec::with_capacity(windows.len());
        for window in windows {
            let text = self.tokenizer.decode(window).map_err(ZkError::from);
            let text = self.traced("chunk_document", path, text)?;
            if text.trim().is_empty() {
                continue;
            }
            records.push(VectorDocumentForStorage::for_chunk(document, text));
        }
        if records.is_empty() {
            tracing::debug!(parent: &self.span, path, "only blank chunks; skipped");
            return Ok(0);
        }

        let stored = self.excerpts.add_documents(&records).await.map_err(ZkError::from);
        self.traced("chunk_document", path, stored)?;
        tracing::debug!(parent: &self.span, path, chunks = records.len(), "document chunked");
        Ok(records.len())
    }

    fn load(&self, relative_path: &str) -> ZkResult<ZkDocument> {
        let raw = self.filesystem.read_file(relative_path)?;
        let (metadata, content) = parse_markdown(relative_path, &raw)?;
        Ok(ZkDocument::new(relative_path, metadata, content))
    }

    fn store(&self, document: &ZkDocument) -> ZkResult<()> {
        let path = &document.relative_path;
        let directory = self.filesystem.get_directory_path(path);
        if !directory.is_empty() {
            self.filesystem.create_directory(&directory)?;
        }
        let text = render_markdown(path, &document.metadata, &document.content)?;
        self.filesystem.write_file(path, &text)
    }

    /// Log a failed result on the engine span and hand it back unchanged.
    fn traced<T>(&self, operation: &str, path: &str, result: ZkResult<T>) -> ZkResult<T> {
        if let Err(err) = &result {
            tracing::error!(
                parent: &self.span,
                operation,
                path,
                error_kind = err.kind(),
                error = %err,
                "operation failed"
            );
        }
        result
    }
}

fn meta_string(metadata: &Metadata, key: &str) -> String {
    metadata
        .get(key)
        .and_then(MetaValue::as_str)
        .unwrap_or_default()
        .to_string()
}
