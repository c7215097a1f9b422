//! SQLite-backed [`VectorStore`].
//!
//! Vectors are stored as little-endian `f32` BLOBs in a single `vectors`
//! table keyed by `(collection, id)`. Queries load the collection and rank
//! it by cosine distance in Rust, which is fast enough for a personal vault.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use zk_chat_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use zk_chat_core::store::{CollectionName, StoredVector, VectorHit, VectorStore};
use zk_chat_core::Metadata;

use crate::{db, migrate};

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Open the database at `db_path`, creating it and its tables if needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = db::connect(db_path)
            .await
            .with_context(|| format!("Failed to open vector database: {}", db_path.display()))?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn reset(&self, collection: CollectionName) -> Result<()> {
        sqlx::query("DELETE FROM vectors WHERE collection = ?")
            .bind(collection.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert(&self, collection: CollectionName, records: &[StoredVector]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO vectors (collection, id, content, metadata_json, dims, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    content = excluded.content,
                    metadata_json = excluded.metadata_json,
                    dims = excluded.dims,
                    embedding = excluded.embedding
                "#,
            )
            .bind(collection.as_str())
            .bind(&record.id)
            .bind(&record.content)
            .bind(metadata_json)
            .bind(record.embedding.len() as i64)
            .bind(vec_to_blob(&record.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: CollectionName,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<VectorHit>> {
        let rows = sqlx::query(
            "SELECT id, content, metadata_json, embedding FROM vectors WHERE collection = ?",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let metadata_json: String = row.get("metadata_json");
            let metadata: Metadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("Corrupt metadata for vector {}", id))?;
            let blob: Vec<u8> = row.get("embedding");
            hits.push(VectorHit {
                distance: cosine_distance(embedding, &blob_to_vec(&blob)),
                content: row.get("content"),
                metadata,
                id,
            });
        }

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
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zk_chat_core::MetaValue;

    fn record(id: &str, embedding: Vec<f32>) -> StoredVector {
        let mut metadata = Metadata::new();
        metadata.insert("id".into(), MetaValue::from(format!("{}.md", id)));
        StoredVector {
            id: id.to_string(),
            content: format!("text of {}", id),
            metadata,
            embedding,
        }
    }

    async fn open_store(tmp: &TempDir) -> SqliteVectorStore {
        SqliteVectorStore::open(&tmp.path().join(".zk_chat_db/vectors.sqlite"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .upsert(CollectionName::Excerpts, &[record("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        let mut changed = record("a", vec![0.0, 1.0]);
        changed.content = "new text".into();
        store
            .upsert(CollectionName::Excerpts, &[changed])
            .await
            .unwrap();

        assert_eq!(store.count(CollectionName::Excerpts).await.unwrap(), 1);
        let hits = store
            .query(CollectionName::Excerpts, &[0.0, 1.0], 5)
            .await
            .unwrap();
        assert_eq!(hits[0].content, "new text");
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_orders_by_distance_and_keeps_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .upsert(
                CollectionName::Excerpts,
                &[
                    record("far", vec![-1.0, 0.0]),
                    record("near", vec![1.0, 0.1]),
                    record("mid", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .query(CollectionName::Excerpts, &[1.0, 0.0], 2)
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert_eq!(hits[0].metadata["id"], MetaValue::from("near.md"));
    }

    #[tokio::test]
    async fn test_reset_only_touches_one_collection() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .upsert(CollectionName::Excerpts, &[record("a", vec![1.0])])
            .await
            .unwrap();
        store
            .upsert(CollectionName::SmartMemory, &[record("m", vec![1.0])])
            .await
            .unwrap();

        store.reset(CollectionName::Excerpts).await.unwrap();
        assert_eq!(store.count(CollectionName::Excerpts).await.unwrap(), 0);
        assert_eq!(store.count(CollectionName::SmartMemory).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open_store(&tmp).await;
            store
                .upsert(CollectionName::Documents, &[record("a", vec![1.0, 2.0])])
                .await
                .unwrap();
            store.close().await;
        }
        let store = open_store(&tmp).await;
        assert_eq!(store.count(CollectionName::Documents).await.unwrap(), 1);
    }
}
