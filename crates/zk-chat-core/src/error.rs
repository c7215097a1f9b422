//! Error taxonomy shared by the engine and its collaborators.

use thiserror::Error;

/// Errors surfaced by vault and index operations.
///
/// The four named variants are the failures callers are expected to
/// branch on. Anything raised by an embedding provider or a vector store
/// backend is carried opaquely in [`ZkError::Backend`].
#[derive(Debug, Error)]
pub enum ZkError {
    /// The requested document does not exist in the vault.
    #[error("document not found: {0}")]
    NotFound(String),

    /// An I/O failure while reading, writing, or creating directories.
    #[error("filesystem error on {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Front-matter could not be produced from, or parsed into, metadata.
    #[error("front-matter error on {path}: {message}")]
    Serialization { path: String, message: String },

    /// Invalid parameters, such as a chunk overlap not smaller than the chunk size.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Failure inside the embedding provider, tokenizer, or vector store.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl ZkError {
    pub fn filesystem(path: impl Into<String>, source: std::io::Error) -> Self {
        ZkError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<String>, message: impl ToString) -> Self {
        ZkError::Serialization {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Short label used as the `error_kind` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            ZkError::NotFound(_) => "not_found",
            ZkError::Filesystem { .. } => "filesystem",
            ZkError::Serialization { .. } => "serialization",
            ZkError::Configuration(_) => "configuration",
            ZkError::Backend(_) => "backend",
        }
    }
}

pub type ZkResult<T> = Result<T, ZkError>;
