//! # zk-chat Core
//!
//! Runtime-free logic for zk-chat: the document model, the metadata value
//! type and its merge rules, the token splitter, the tokenizer and embedding
//! traits, and the vector store abstraction.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP clients.
//! Concrete providers and the SQLite store live in the `zk-chat` app crate.

pub mod embedding;
pub mod error;
pub mod metadata;
pub mod models;
pub mod splitter;
pub mod store;
pub mod tokenizer;

pub use error::{ZkError, ZkResult};
pub use metadata::{merge_metadata, MetaValue, Metadata};
pub use models::{
    DocumentChunk, DocumentQueryResult, QueryResult, VectorDocumentForStorage, VectorQueryResult,
    ZkDocument,
};
