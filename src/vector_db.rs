//! Collection-scoped adapter over a [`VectorStore`] and an
//! [`EmbeddingProvider`].
//!
//! Callers hand it text; it computes embeddings and keeps the store's
//! `(id, text, metadata, embedding)` rows in sync. Writing a record whose
//! id is already stored overwrites it.

use anyhow::{bail, Result};
use std::sync::Arc;

use zk_chat_core::embedding::EmbeddingProvider;
use zk_chat_core::store::{CollectionName, StoredVector, VectorStore};
use zk_chat_core::{VectorDocumentForStorage, VectorQueryResult};

/// Upper bound on texts sent to the provider in one request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Clone)]
pub struct VectorDatabase {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    collection: CollectionName,
    batch_size: usize,
}

impl VectorDatabase {
    pub fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn EmbeddingProvider>,
        collection: CollectionName,
    ) -> Self {
        Self {
            store,
            provider,
            collection,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn collection(&self) -> CollectionName {
        self.collection
    }

    /// Drop every record in this adapter's collection.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset(self.collection).await
    }

    /// Embed and upsert `documents`, one provider call per batch.
    pub async fn add_documents(&self, documents: &[VectorDocumentForStorage]) -> Result<()> {
        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embeddings = self.provider.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                bail!(
                    "embedding provider {} returned {} vectors for {} texts",
                    self.provider.model_name(),
                    embeddings.len(),
                    batch.len()
                );
            }

            let records: Vec<StoredVector> = batch
                .iter()
                .zip(embeddings)
                .map(|(doc, embedding)| StoredVector {
                    id: doc.id.clone(),
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                    embedding,
                })
                .collect();
            self.store.upsert(self.collection, &records).await?;
        }
        Ok(())
    }

    /// Nearest `n_results` records to `text`, closest first.
    pub async fn query(&self, text: &str, n_results: usize) -> Result<Vec<VectorQueryResult>> {
        let embedding = self
            .provider
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let hits = self
            .store
            .query(self.collection, &embedding, n_results)
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| VectorQueryResult {
                document: VectorDocumentForStorage {
                    id: hit.id,
                    content: hit.content,
                    metadata: hit.metadata,
                },
                distance: hit.distance,
            })
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count(self.collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use zk_chat_core::store::memory::InMemoryVectorStore;
    use zk_chat_core::Metadata;

    /// Embeds text by its length; records every batch it sees.
    struct LengthEmbedder {
        batches: Mutex<Vec<usize>>,
        drop_one: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            let mut out: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect();
            if self.drop_one {
                out.pop();
            }
            Ok(out)
        }
    }

    fn embedder(drop_one: bool) -> Arc<LengthEmbedder> {
        Arc::new(LengthEmbedder {
            batches: Mutex::new(Vec::new()),
            drop_one,
        })
    }

    fn doc(text: &str) -> VectorDocumentForStorage {
        VectorDocumentForStorage {
            id: format!("id-{}", text),
            content: text.to_string(),
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn test_add_documents_batches_and_upserts() {
        let store = Arc::new(InMemoryVectorStore::new());
        let provider = embedder(false);
        let db = VectorDatabase::new(store.clone(), provider.clone(), CollectionName::Excerpts)
            .with_batch_size(2);

        let docs: Vec<_> = ["a", "bb", "ccc", "a"].iter().map(|t| doc(t)).collect();
        db.add_documents(&docs).await.unwrap();

        assert_eq!(*provider.batches.lock().unwrap(), vec![2, 2]);
        assert_eq!(db.count().await.unwrap(), 3);
        assert_eq!(store.ids(CollectionName::SmartMemory).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_query_reattaches_stored_record() {
        let store = Arc::new(InMemoryVectorStore::new());
        let db = VectorDatabase::new(store, embedder(false), CollectionName::Excerpts);
        let mut stored = doc("hello");
        stored.metadata.insert("id".into(), "greeting.md".into());
        db.add_documents(&[stored.clone()]).await.unwrap();

        let results = db.query("hello", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document, stored);
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_is_error() {
        let store = Arc::new(InMemoryVectorStore::new());
        let db = VectorDatabase::new(store, embedder(true), CollectionName::Excerpts);
        assert!(db.add_documents(&[doc("x"), doc("y")]).await.is_err());
    }
}
