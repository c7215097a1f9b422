//! Tools the chat assistant can call against a vault.
//!
//! Each tool is a [`Tool`]: a name, a one-line description, an OpenAI
//! function-calling JSON Schema for its parameters, and an async `execute`
//! that takes a JSON object and returns JSON.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                ToolRegistry                 │
//! │  read / list / find excerpts+notes / memory │
//! │  + create / rename / delete (writes only)   │
//! └──────────────────────┬──────────────────────┘
//!                        ▼
//!            ToolContext { Zettelkasten, SmartMemory }
//! ```
//!
//! Tools that modify the vault are only registered when writes are enabled
//! (`zkchat tool call --unsafe`).

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use zk_chat_core::{Metadata, ZkDocument};

use crate::config::RetrievalConfig;
use crate::smart_memory::{SmartMemory, DEFAULT_MEMORY_RESULTS};
use crate::zettelkasten::Zettelkasten;

/// A function the assistant can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, e.g. `"read_zk_document"`.
    fn name(&self) -> &str;

    /// One-line description used by the model to pick a tool.
    fn description(&self) -> &str;

    /// Whether the tool changes files in the vault.
    fn modifies_vault(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) for the parameters.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// What a tool can reach while executing.
pub struct ToolContext {
    zk: Arc<Zettelkasten>,
    memory: Arc<SmartMemory>,
    retrieval: RetrievalConfig,
}

impl ToolContext {
    pub fn new(zk: Arc<Zettelkasten>, memory: Arc<SmartMemory>, retrieval: RetrievalConfig) -> Self {
        Self {
            zk,
            memory,
            retrieval,
        }
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    let value = params[key].as_str().unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

fn optional_count(params: &Value, key: &str, default: usize) -> usize {
    params[key]
        .as_u64()
        .map(|n| n as usize)
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

// ═══════════════════════════════════════════════════════════════════════
// Read-only tools
// ═══════════════════════════════════════════════════════════════════════

pub struct ReadZkDocument;

#[async_trait]
impl Tool for ReadZkDocument {
    fn name(&self) -> &str {
        "read_zk_document"
    }

    fn description(&self) -> &str {
        "Read a document from the Zettelkasten by its relative path"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": { "type": "string", "description": "Path of the note within the vault, e.g. \"ideas/Atomic Notes.md\"" }
            },
            "required": ["relative_path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let path = required_str(&params, "relative_path")?;
        let document = ctx.zk.read_document(path)?;
        Ok(json!({
            "relative_path": document.relative_path,
            "title": document.title(),
            "metadata": document.metadata,
            "content": document.content,
        }))
    }
}

pub struct ListZkDocuments;

#[async_trait]
impl Tool for ListZkDocuments {
    fn name(&self) -> &str {
        "list_zk_documents"
    }

    fn description(&self) -> &str {
        "List the path and title of every document in the Zettelkasten"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let documents: Vec<Value> = ctx
            .zk
            .list_documents()?
            .into_iter()
            .map(|(relative_path, title)| json!({ "relative_path": relative_path, "title": title }))
            .collect();
        Ok(json!({ "documents": documents }))
    }
}

pub struct FindExcerptsRelatedTo;

#[async_trait]
impl Tool for FindExcerptsRelatedTo {
    fn name(&self) -> &str {
        "find_excerpts_related_to"
    }

    fn description(&self) -> &str {
        "Find excerpts from Zettelkasten documents that are semantically related to a query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for" },
                "n_results": { "type": "integer", "description": "Max excerpts", "default": 5 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let n_results = optional_count(&params, "n_results", ctx.retrieval.n_results);
        let excerpts = ctx
            .zk
            .query_chunks(query, n_results, ctx.retrieval.max_distance)
            .await?;
        Ok(json!({ "excerpts": excerpts }))
    }
}

pub struct FindZkDocumentsRelatedTo;

#[async_trait]
impl Tool for FindZkDocumentsRelatedTo {
    fn name(&self) -> &str {
        "find_zk_documents_related_to"
    }

    fn description(&self) -> &str {
        "Find whole Zettelkasten documents that are semantically related to a query; returns their paths and titles"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for" },
                "n_results": { "type": "integer", "description": "Max documents", "default": 5 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let n_results = optional_count(&params, "n_results", ctx.retrieval.n_results);
        let documents: Vec<Value> = ctx
            .zk
            .query_documents(query, n_results, ctx.retrieval.max_distance)
            .await?
            .into_iter()
            .map(|hit| {
                json!({
                    "relative_path": hit.document_id,
                    "title": hit.document_title,
                    "distance": hit.distance,
                })
            })
            .collect();
        Ok(json!({ "documents": documents }))
    }
}

pub struct StoreInSmartMemory;

#[async_trait]
impl Tool for StoreInSmartMemory {
    fn name(&self) -> &str {
        "store_in_smart_memory"
    }

    fn description(&self) -> &str {
        "Remember a piece of information about the user or the conversation for later"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "information": { "type": "string", "description": "The information to remember" }
            },
            "required": ["information"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let information = required_str(&params, "information")?;
        let id = ctx.memory.store(information).await?;
        Ok(json!({ "id": id }))
    }
}

pub struct RetrieveFromSmartMemory;

#[async_trait]
impl Tool for RetrieveFromSmartMemory {
    fn name(&self) -> &str {
        "retrieve_from_smart_memory"
    }

    fn description(&self) -> &str {
        "Recall previously remembered information related to a query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to recall" },
                "n_results": { "type": "integer", "description": "Max memories", "default": DEFAULT_MEMORY_RESULTS }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let n_results = optional_count(&params, "n_results", DEFAULT_MEMORY_RESULTS);
        let memories: Vec<Value> = ctx
            .memory
            .retrieve(query, n_results)
            .await?
            .into_iter()
            .map(|hit| json!({ "content": hit.document.content, "distance": hit.distance }))
            .collect();
        Ok(json!({ "memories": memories }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Vault-modifying tools
// ═══════════════════════════════════════════════════════════════════════

pub struct CreateOrOverwriteZkDocument;

#[async_trait]
impl Tool for CreateOrOverwriteZkDocument {
    fn name(&self) -> &str {
        "create_or_overwrite_zk_document"
    }

    fn description(&self) -> &str {
        "Create a new document in the Zettelkasten, replacing it if it already exists"
    }

    fn modifies_vault(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": { "type": "string", "description": "Path of the note within the vault; \".md\" is added if missing" },
                "content": { "type": "string", "description": "Markdown body" },
                "metadata": { "type": "object", "description": "Front-matter fields" }
            },
            "required": ["relative_path", "content"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let path = with_markdown_extension(required_str(&params, "relative_path")?);
        let content = params["content"].as_str().unwrap_or("");
        let metadata: Metadata = match params.get("metadata") {
            Some(Value::Null) | None => Metadata::new(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        ctx.zk
            .create_or_overwrite_document(&ZkDocument::new(path.clone(), metadata, content))?;
        Ok(json!({ "written": path }))
    }
}

pub struct RenameZkDocument;

#[async_trait]
impl Tool for RenameZkDocument {
    fn name(&self) -> &str {
        "rename_zk_document"
    }

    fn description(&self) -> &str {
        "Move a document in the Zettelkasten to a new relative path"
    }

    fn modifies_vault(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": { "type": "string" },
                "target_path": { "type": "string" }
            },
            "required": ["source_path", "target_path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let from = required_str(&params, "source_path")?;
        let to = with_markdown_extension(required_str(&params, "target_path")?);
        ctx.zk.rename_document(from, &to)?;
        Ok(json!({ "renamed": from, "to": to }))
    }
}

pub struct DeleteZkDocument;

#[async_trait]
impl Tool for DeleteZkDocument {
    fn name(&self) -> &str {
        "delete_zk_document"
    }

    fn description(&self) -> &str {
        "Delete a document from the Zettelkasten"
    }

    fn modifies_vault(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": { "type": "string" }
            },
            "required": ["relative_path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let path = required_str(&params, "relative_path")?;
        ctx.zk.delete_document(path)?;
        Ok(json!({ "deleted": path }))
    }
}

fn with_markdown_extension(path: &str) -> String {
    if path.ends_with(".md") {
        path.to_string()
    } else {
        format!("{}.md", path)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The read-only tools, plus the vault-modifying ones if `allow_writes`.
    pub fn with_builtins(allow_writes: bool) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadZkDocument));
        registry.register(Box::new(ListZkDocuments));
        registry.register(Box::new(FindExcerptsRelatedTo));
        registry.register(Box::new(FindZkDocumentsRelatedTo));
        registry.register(Box::new(StoreInSmartMemory));
        registry.register(Box::new(RetrieveFromSmartMemory));
        if allow_writes {
            registry.register(Box::new(CreateOrOverwriteZkDocument));
            registry.register(Box::new(RenameZkDocument));
            registry.register(Box::new(DeleteZkDocument));
        }
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Look up `name` and run it with `params`.
    pub async fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        let tool = match self.find(name) {
            Some(tool) => tool,
            None => bail!("Unknown tool: {}", name),
        };
        if !params.is_object() {
            bail!("Parameters for {} must be a JSON object", name);
        }
        tracing::debug!(tool = name, "executing tool");
        tool.execute(params, ctx).await
    }

    /// Function-calling descriptors for every registered tool.
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema(),
                    }
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
