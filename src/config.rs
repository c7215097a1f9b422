//! Per-vault configuration.
//!
//! Each vault carries its own TOML file at `<vault>/.zk_chat.toml`. It is
//! created with defaults the first time a vault is opened and rewritten
//! after every successful reindex, since it also holds the `last_indexed`
//! watermark used to decide between a full and an incremental reindex.
//!
//! ```toml
//! [chunking]
//! chunk_size = 500
//! chunk_overlap = 100
//!
//! [retrieval]
//! n_results = 5
//! max_distance = 1.0
//!
//! [embedding]
//! provider = "ollama"
//! model = "nomic-embed-text"
//! dims = 768
//!
//! [index]
//! last_indexed = "2025-03-01T10:00:00Z"
//!
//! [logging]
//! level = "warn"
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the per-vault configuration, relative to the vault root.
pub const CONFIG_FILENAME: &str = ".zk_chat.toml";

/// Directory holding the vector database, relative to the vault root.
pub const DB_DIRNAME: &str = ".zk_chat_db";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Absolute vault root. Not persisted; set from where the file was loaded.
    #[serde(skip)]
    pub vault: PathBuf,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
            max_distance: default_max_distance(),
        }
    }
}

fn default_n_results() -> usize {
    5
}
fn default_max_distance() -> f32 {
    1.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider (default `http://localhost:11434`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: Some("nomic-embed-text".to_string()),
            dims: Some(768),
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IndexConfig {
    /// Watermark: documents modified after this instant need reindexing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Default configuration for a vault that has none yet.
    pub fn for_vault(vault: &Path) -> Self {
        Self {
            vault: vault.to_path_buf(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn config_path(vault: &Path) -> PathBuf {
        vault.join(CONFIG_FILENAME)
    }

    /// Path of the SQLite vector database for this vault.
    pub fn db_path(&self) -> PathBuf {
        self.vault.join(DB_DIRNAME).join("vectors.sqlite")
    }

    /// Load the vault's configuration, or `None` if it has never been saved.
    pub fn load(vault: &Path) -> Result<Option<Self>> {
        let path = Self::config_path(vault);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.vault = vault.to_path_buf();
        config.validate()?;
        Ok(Some(config))
    }

    /// Load the vault's configuration, writing defaults on first use.
    pub fn load_or_initialize(vault: &Path) -> Result<Self> {
        if let Some(config) = Self::load(vault)? {
            return Ok(config);
        }
        let config = Self::for_vault(vault);
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path(&self.vault);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn last_indexed(&self) -> Option<DateTime<Utc>> {
        self.index.last_indexed
    }

    pub fn set_last_indexed(&mut self, at: DateTime<Utc>) {
        self.index.last_indexed = Some(at);
    }

    pub fn validate(&self) -> Result<()> {
        // Validate chunking
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("chunking.chunk_size must be > 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            anyhow::bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }

        // Validate retrieval
        if self.retrieval.n_results < 1 {
            anyhow::bail!("retrieval.n_results must be >= 1");
        }
        if !(self.retrieval.max_distance >= 0.0) {
            anyhow::bail!("retrieval.max_distance must be >= 0.0");
        }

        // Validate embedding
        if self.embedding.is_enabled() {
            if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }
        if self.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "openai" | "ollama" => {}
            other => anyhow::bail!(
                "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
                other
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_none() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_or_initialize_writes_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_or_initialize(tmp.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert!(config.last_indexed().is_none());
        assert!(tmp.path().join(CONFIG_FILENAME).exists());
    }

    #[test]
    fn test_watermark_roundtrips_through_file() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::load_or_initialize(tmp.path()).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        config.set_last_indexed(at);
        config.save().unwrap();

        let reloaded = Config::load(tmp.path()).unwrap().unwrap();
        assert_eq!(reloaded.last_indexed(), Some(at));
        assert_eq!(reloaded.vault, tmp.path());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[chunking]\nchunk_size = 50\nchunk_overlap = 0\n",
        )
        .unwrap();
        let config = Config::load(tmp.path()).unwrap().unwrap();
        assert_eq!(config.chunking.chunk_size, 50);
        assert_eq!(config.retrieval.n_results, 5);
        assert_eq!(config.embedding.provider, "ollama");
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n",
        )
        .unwrap();
        let err = Config::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::for_vault(Path::new("/tmp/vault"));
        config.embedding.provider = "carrier-pigeon".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_provider_requires_dims() {
        let mut config = Config::for_vault(Path::new("/tmp/vault"));
        config.embedding.dims = None;
        assert!(config.validate().is_err());
        config.embedding.provider = "disabled".into();
        assert!(config.validate().is_ok());
    }
}
