//! # zk-chat
//!
//! Chunking, indexing and retrieval for a Markdown Zettelkasten.
//!
//! Notes in a vault are split into overlapping token windows, embedded,
//! and stored in a local vector database so an assistant can pull relevant
//! excerpts into a conversation. The vault on disk is always the source of
//! truth; the index can be rebuilt from it at any time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ Vault (*.md) │──▶│ Zettelkasten │──▶│ VectorDatabase │──▶ SQLite
//! │ front-matter │   │ split+chunk  │   │ embed + upsert │   (vectors)
//! └──────────────┘   └──────┬───────┘   └────────────────┘
//!                           │
//!            ┌──────────────┼───────────────┐
//!            ▼              ▼               ▼
//!      ┌──────────┐   ┌──────────┐    ┌───────────┐
//!      │ reindex  │   │  tools   │    │ CLI       │
//!      │ driver   │   │ registry │    │ (zkchat)  │
//!      └──────────┘   └──────────┘    └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Per-vault TOML configuration |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`fs_gateway`] | Vault file access |
//! | [`markdown`] | Front-matter parsing and rendering |
//! | [`tokenizer`] | tiktoken BPE tokenizer |
//! | [`embedding`] | Ollama / OpenAI embedding providers |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Schema |
//! | [`sqlite_store`] | SQLite vector store |
//! | [`vector_db`] | Collection-scoped embed + store adapter |
//! | [`zettelkasten`] | The engine: documents, indexing, querying |
//! | [`smart_memory`] | Free-form memory collection |
//! | [`reindex`] | Full-or-incremental reindex driver |
//! | [`tools`] | Tools exposed to the chat assistant |
//! | [`vault`] | Wiring for an opened vault |
//! | [`commands`] | CLI subcommands |
//!
//! Runtime-free pieces (document model, metadata merge, splitter, store
//! and provider traits) live in the `zk-chat-core` crate.

pub mod commands;
pub mod config;
pub mod db;
pub mod embedding;
pub mod fs_gateway;
pub mod logging;
pub mod markdown;
pub mod migrate;
pub mod reindex;
pub mod smart_memory;
pub mod sqlite_store;
pub mod tokenizer;
pub mod tools;
pub mod vault;
pub mod vector_db;
pub mod zettelkasten;
