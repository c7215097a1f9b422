//! Watermark handling of the reindex driver.

mod common;

use std::sync::Arc;
use tempfile::TempDir;

use common::test_vault;
use zk_chat::config::Config;
use zk_chat::embedding::DisabledProvider;
use zk_chat::reindex::{reindex, ReindexMode};
use zk_chat::vault::Vault;
use zk_chat_core::store::memory::InMemoryVectorStore;
use zk_chat_core::store::CollectionName;
use zk_chat_core::tokenizer::CharTokenizer;

#[tokio::test]
async fn test_first_run_is_full_then_incremental() {
    let mut tv = test_vault(&[("Apple.md", "Apples are red.")]);
    assert!(tv.vault.config.last_indexed().is_none());

    let first = reindex(&mut tv.vault.config, &tv.vault.zk, false)
        .await
        .unwrap();
    assert_eq!(first.mode, ReindexMode::Full);
    assert_eq!(first.summary.documents_indexed, 1);
    assert_eq!(tv.vault.config.last_indexed(), Some(first.indexed_at));

    // Watermark was persisted next to the notes.
    let saved = Config::load(tv.path()).unwrap().unwrap();
    assert_eq!(saved.last_indexed(), Some(first.indexed_at));

    let second = reindex(&mut tv.vault.config, &tv.vault.zk, false)
        .await
        .unwrap();
    assert_eq!(
        second.mode,
        ReindexMode::Incremental {
            since: first.indexed_at
        }
    );
    assert!(second.indexed_at >= first.indexed_at);
}

#[tokio::test]
async fn test_force_full_ignores_watermark() {
    let mut tv = test_vault(&[("Apple.md", "Apples are red.")]);
    reindex(&mut tv.vault.config, &tv.vault.zk, false)
        .await
        .unwrap();

    let forced = reindex(&mut tv.vault.config, &tv.vault.zk, true)
        .await
        .unwrap();
    assert_eq!(forced.mode, ReindexMode::Full);
    assert_eq!(forced.summary.documents_indexed, 1);
    assert_eq!(tv.store.ids(CollectionName::Excerpts).unwrap().len(), 1);
}

#[tokio::test]
async fn test_watermark_is_taken_before_the_run() {
    let mut tv = test_vault(&[("Apple.md", "Apples are red.")]);
    let before = chrono::Utc::now();
    let outcome = reindex(&mut tv.vault.config, &tv.vault.zk, false)
        .await
        .unwrap();
    let after = chrono::Utc::now();
    assert!(outcome.indexed_at >= before && outcome.indexed_at <= after);
}

#[tokio::test]
async fn test_failed_run_keeps_old_watermark() {
    let dir = TempDir::new().unwrap();
    common::write_note(dir.path(), "Apple.md", "Apples are red.");

    let mut vault = Vault::assemble(
        Config::for_vault(dir.path()),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(DisabledProvider),
        Arc::new(CharTokenizer),
    )
    .unwrap();

    let err = reindex(&mut vault.config, &vault.zk, false).await;
    assert!(err.is_err());
    assert!(vault.config.last_indexed().is_none());
    assert!(Config::load(dir.path()).unwrap().is_none());
}
