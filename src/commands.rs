//! `zkchat` subcommand implementations. Each prints a human-readable
//! report to stdout.

use anyhow::{bail, Result};
use serde_json::Value;

use zk_chat_core::store::CollectionName;
use zk_chat_core::{MetaValue, Metadata, ZkDocument};

use crate::reindex::{reindex, ReindexMode};
use crate::tools::ToolRegistry;
use crate::vault::Vault;

pub async fn run_index(vault: &mut Vault, full: bool) -> Result<()> {
    let outcome = reindex(&mut vault.config, &vault.zk, full).await?;

    match outcome.mode {
        ReindexMode::Full => println!("Full reindex complete."),
        ReindexMode::Incremental { since } => {
            println!("Incremental reindex complete (changes since {}).", since.to_rfc3339())
        }
    }
    println!("  documents indexed: {}", outcome.summary.documents_indexed);
    println!("  documents skipped: {}", outcome.summary.documents_skipped);
    println!("  chunks stored:     {}", outcome.summary.chunks_stored);
    println!("  notes stored:      {}", outcome.summary.documents_stored);
    println!("  watermark:         {}", outcome.indexed_at.to_rfc3339());
    Ok(())
}

pub async fn run_query(
    vault: &Vault,
    query: &str,
    limit: Option<usize>,
    max_distance: Option<f32>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let n_results = limit.unwrap_or(vault.config.retrieval.n_results);
    let max_distance = max_distance.unwrap_or(vault.config.retrieval.max_distance);
    let results = vault.zk.query_chunks(query, n_results, max_distance).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} ({})",
            i + 1,
            result.distance,
            result.chunk.document_title,
            result.chunk.document_id
        );
        for line in result.chunk.text.lines() {
            println!("    {}", line);
        }
        println!();
    }
    Ok(())
}

pub fn run_read(vault: &Vault, path: &str) -> Result<()> {
    let document = vault.zk.read_document(path)?;

    println!("--- Document ---");
    println!("path:     {}", document.relative_path);
    println!("title:    {}", document.title());
    if !document.metadata.is_empty() {
        println!("metadata: {}", serde_json::to_string(&document.metadata)?);
    }
    println!();
    println!("--- Body ---");
    println!("{}", document.content);
    Ok(())
}

pub fn run_list(vault: &Vault) -> Result<()> {
    let documents = vault.zk.list_documents()?;
    if documents.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    for (path, title) in documents {
        println!("{}\t{}", path, title);
    }
    Ok(())
}

pub fn run_write(
    vault: &Vault,
    path: &str,
    content: &str,
    append: bool,
    meta: Vec<(String, String)>,
) -> Result<()> {
    let mut metadata = Metadata::new();
    for (key, raw) in meta {
        metadata.insert(key, parse_meta_value(&raw));
    }

    let document = ZkDocument::new(path, metadata, content);
    if append {
        vault.zk.create_or_append_document(&document)?;
    } else {
        vault.zk.create_or_overwrite_document(&document)?;
    }
    println!("Wrote {}", path);
    Ok(())
}

/// `--meta` values are read as YAML scalars or flow collections
/// (`tags=[a, b]`, `draft=true`), falling back to a plain string.
fn parse_meta_value(raw: &str) -> MetaValue {
    serde_yaml::from_str(raw).unwrap_or_else(|_| MetaValue::String(raw.to_string()))
}

pub async fn run_memory_store(vault: &Vault, information: &str) -> Result<()> {
    let id = vault.memory.store(information).await?;
    println!("Stored as {}", id);
    Ok(())
}

pub async fn run_memory_retrieve(vault: &Vault, query: &str, limit: usize) -> Result<()> {
    let hits = vault.memory.retrieve(query, limit).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in hits {
        println!("[{:.4}] {}", hit.distance, hit.document.content);
    }
    Ok(())
}

pub async fn run_memory_reset(vault: &Vault) -> Result<()> {
    vault.memory.reset().await?;
    println!("Smart memory cleared.");
    Ok(())
}

pub fn run_tool_list(allow_writes: bool) -> Result<()> {
    let registry = ToolRegistry::with_builtins(allow_writes);
    for tool in registry.tools() {
        let marker = if tool.modifies_vault() { " (writes)" } else { "" };
        println!("{}{}\n    {}", tool.name(), marker, tool.description());
    }
    Ok(())
}

pub async fn run_tool_call(
    vault: &Vault,
    name: &str,
    params: Vec<(String, String)>,
    allow_writes: bool,
) -> Result<()> {
    let registry = ToolRegistry::with_builtins(allow_writes);
    if registry.find(name).is_none() && ToolRegistry::with_builtins(true).find(name).is_some() {
        bail!("Tool {} modifies the vault; re-run with --unsafe", name);
    }

    let mut object = serde_json::Map::new();
    for (key, raw) in params {
        let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        object.insert(key, value);
    }

    let result = registry
        .call(name, Value::Object(object), &vault.tool_context())
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn run_status(vault: &Vault) -> Result<()> {
    println!("vault:        {}", vault.config.vault.display());
    println!("database:     {}", vault.config.db_path().display());
    println!(
        "embedding:    {} ({})",
        vault.config.embedding.provider,
        vault.config.embedding.model.as_deref().unwrap_or("-")
    );
    match vault.config.last_indexed() {
        Some(at) => println!("last indexed: {}", at.to_rfc3339()),
        None => println!("last indexed: never"),
    }
    for collection in CollectionName::ALL {
        println!(
            "{:<13} {}",
            format!("{}:", collection),
            vault.store.count(collection).await?
        );
    }
    Ok(())
}
