//! Free-form memory for the chat loop.
//!
//! Whatever the assistant decides is worth remembering is stored verbatim
//! in the `smart_memory` collection under a random id, then recalled by
//! similarity to later questions.

use anyhow::Result;
use uuid::Uuid;

use zk_chat_core::{Metadata, VectorDocumentForStorage, VectorQueryResult};

use crate::vector_db::VectorDatabase;

/// Results returned by [`SmartMemory::retrieve`] when the caller has no preference.
pub const DEFAULT_MEMORY_RESULTS: usize = 5;

pub struct SmartMemory {
    db: VectorDatabase,
}

impl SmartMemory {
    pub fn new(db: VectorDatabase) -> Self {
        Self { db }
    }

    /// Remember `information`. Returns the id it was stored under.
    pub async fn store(&self, information: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.db
            .add_documents(&[VectorDocumentForStorage {
                id: id.clone(),
                content: information.to_string(),
                metadata: Metadata::new(),
            }])
            .await?;
        tracing::debug!(id = %id, "stored in smart memory");
        Ok(id)
    }

    pub async fn retrieve(&self, query: &str, n_results: usize) -> Result<Vec<VectorQueryResult>> {
        self.db.query(query, n_results).await
    }

    /// Forget everything.
    pub async fn reset(&self) -> Result<()> {
        self.db.reset().await
    }

    pub async fn count(&self) -> Result<usize> {
        self.db.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use zk_chat_core::embedding::EmbeddingProvider;
    use zk_chat_core::store::memory::InMemoryVectorStore;
    use zk_chat_core::store::CollectionName;

    struct FirstByte;

    #[async_trait]
    impl EmbeddingProvider for FirstByte {
        fn model_name(&self) -> &str {
            "first-byte"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| match t.bytes().next() {
                    Some(b'a') => vec![1.0, 0.0],
                    _ => vec![0.0, 1.0],
                })
                .collect())
        }
    }

    fn memory() -> SmartMemory {
        let db = VectorDatabase::new(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(FirstByte),
            CollectionName::SmartMemory,
        );
        SmartMemory::new(db)
    }

    #[tokio::test]
    async fn test_store_uses_fresh_ids_and_no_metadata() {
        let memory = memory();
        let first = memory.store("apples are my favourite").await.unwrap();
        let second = memory.store("apples are my favourite").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(memory.count().await.unwrap(), 2);

        let hits = memory.retrieve("apple", DEFAULT_MEMORY_RESULTS).await.unwrap();
        assert!(hits.iter().all(|h| h.document.metadata.is_empty()));
    }

    #[tokio::test]
    async fn test_retrieve_closest_first_and_reset() {
        let memory = memory();
        memory.store("zebras are striped").await.unwrap();
        memory.store("apples are red").await.unwrap();

        let hits = memory.retrieve("about apples", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.content, "apples are red");

        memory.reset().await.unwrap();
        assert_eq!(memory.count().await.unwrap(), 0);
    }
}
