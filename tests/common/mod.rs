#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use zk_chat::config::Config;
use zk_chat::vault::Vault;
use zk_chat_core::embedding::EmbeddingProvider;
use zk_chat_core::store::memory::InMemoryVectorStore;
use zk_chat_core::tokenizer::CharTokenizer;

pub const VOCABULARY_DIMS: usize = 128;

/// Bag-of-words embedder: one dimension per distinct lowercase word.
///
/// Deterministic and offline; texts sharing more words end up closer.
/// Every embedded text is recorded in `seen`.
#[derive(Default)]
pub struct VocabularyEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
    pub seen: Mutex<Vec<String>>,
}

impl VocabularyEmbedder {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn clear_seen(&self) {
        self.seen.lock().unwrap().clear();
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0f32; VOCABULARY_DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocabulary.len();
            let slot = *vocabulary.entry(word.to_string()).or_insert(next);
            vector[slot % VOCABULARY_DIMS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for VocabularyEmbedder {
    fn model_name(&self) -> &str {
        "vocabulary"
    }

    fn dims(&self) -> usize {
        VOCABULARY_DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

pub struct TestVault {
    pub dir: TempDir,
    pub vault: Vault,
    pub store: Arc<InMemoryVectorStore>,
    pub embedder: Arc<VocabularyEmbedder>,
}

impl TestVault {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative_path: &str, content: &str) {
        write_note(self.dir.path(), relative_path, content);
    }
}

pub fn write_note(root: &Path, relative_path: &str, content: &str) {
    let path = root.join(relative_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A vault in a temp dir backed by the in-memory store, the char tokenizer
/// and the vocabulary embedder.
pub fn test_vault(notes: &[(&str, &str)]) -> TestVault {
    let dir = TempDir::new().unwrap();
    for (path, content) in notes {
        write_note(dir.path(), path, content);
    }

    let config = Config::for_vault(dir.path());
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(VocabularyEmbedder::default());
    let vault = Vault::assemble(
        config,
        store.clone(),
        embedder.clone(),
        Arc::new(CharTokenizer),
    )
    .unwrap();

    TestVault {
        dir,
        vault,
        store,
        embedder,
    }
}
