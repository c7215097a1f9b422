//! Wiring for one opened vault.
//!
//! Loads (or initialises) the vault config, opens the vector database
//! under `.zk_chat_db/`, and builds the engine and smart memory on top of
//! one shared store and embedding provider.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use zk_chat_core::embedding::EmbeddingProvider;
use zk_chat_core::store::{CollectionName, VectorStore};
use zk_chat_core::tokenizer::Tokenizer;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::fs_gateway::MarkdownFilesystemGateway;
use crate::smart_memory::SmartMemory;
use crate::sqlite_store::SqliteVectorStore;
use crate::tokenizer::TiktokenTokenizer;
use crate::tools::ToolContext;
use crate::vector_db::VectorDatabase;
use crate::zettelkasten::Zettelkasten;

pub struct Vault {
    pub config: Config,
    pub store: Arc<dyn VectorStore>,
    pub zk: Arc<Zettelkasten>,
    pub memory: Arc<SmartMemory>,
}

impl Vault {
    /// Open the vault at `path` with the SQLite store and the configured provider.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            bail!("Vault directory does not exist: {}", path.display());
        }
        let root = std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve vault path: {}", path.display()))?;

        let config = Config::load_or_initialize(&root)?;
        let provider = create_provider(&config.embedding)?;
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(TiktokenTokenizer::cl100k()?);
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(&config.db_path()).await?);

        Self::assemble(config, store, provider, tokenizer)
    }

    /// Build a vault from explicit parts.
    pub fn assemble(
        config: Config,
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn EmbeddingProvider>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        let database = |collection| {
            VectorDatabase::new(store.clone(), provider.clone(), collection)
                .with_batch_size(config.embedding.batch_size)
        };

        let filesystem = MarkdownFilesystemGateway::new(&config.vault)?;
        let zk = Zettelkasten::new(
            tokenizer,
            database(CollectionName::Excerpts),
            database(CollectionName::Documents),
            filesystem,
        );
        let memory = SmartMemory::new(database(CollectionName::SmartMemory));

        Ok(Self {
            store,
            zk: Arc::new(zk),
            memory: Arc::new(memory),
            config,
        })
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(
            self.zk.clone(),
            self.memory.clone(),
            self.config.retrieval.clone(),
        )
    }
}
