//! In-memory [`VectorStore`] implementation for tests and small vaults.
//!
//! Records live in a `BTreeMap` per collection behind a `std::sync::RwLock`.
//! Search is brute-force cosine distance over every stored vector; ties are
//! broken by id so results are deterministic.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_distance;

use super::{CollectionName, StoredVector, VectorHit, VectorStore};

type Collection = BTreeMap<String, StoredVector>;

/// In-memory store keyed by collection, then record id.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<CollectionName, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Ids currently stored in `collection`, in sorted order.
    pub fn ids(&self, collection: CollectionName) -> Result<Vec<String>> {
        let guard = self
            .collections
            .read()
            .map_err(|_| anyhow!("in-memory vector store lock poisoned"))?;
        Ok(guard
            .get(&collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn reset(&self, collection: CollectionName) -> Result<()> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| anyhow!("in-memory vector store lock poisoned"))?;
        guard.remove(&collection);
        Ok(())
    }

    async fn upsert(&self, collection: CollectionName, records: &[StoredVector]) -> Result<()> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| anyhow!("in-memory vector store lock poisoned"))?;
        let stored = guard.entry(collection).or_default();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: CollectionName,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<VectorHit>> {
        let guard = self
            .collections
            .read()
            .map_err(|_| anyhow!("in-memory vector store lock poisoned"))?;
        let stored = match guard.get(&collection) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        let mut hits: Vec<VectorHit> = stored
            .values()
            .map(|sv| VectorHit {
                id: sv.id.clone(),
                content: sv.content.clone(),
                metadata: sv.metadata.clone(),
                distance: cosine_distance(embedding, &sv.embedding),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(n_results);
        Ok(hits)
    }

    async fn count(&self, collection: CollectionName) -> Result<usize> {
        let guard = self
            .collections
            .read()
            .map_err(|_| anyhow!("in-memory vector store lock poisoned"))?;
        Ok(guard.get(&collection).map(|c| c.len()).unwrap_or(0))
    }
}
