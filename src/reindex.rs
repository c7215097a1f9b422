//! Full-or-incremental reindex driver.
//!
//! The vault config's `[index].last_indexed` watermark decides the mode:
//! without one (or when forced) the whole vault is re-chunked from an empty
//! collection; otherwise only notes modified since the watermark are.
//!
//! The new watermark is the time the run *started*, so edits made while a
//! run is in progress are picked up by the next one. It is written only
//! after the run succeeds; a failed run leaves the old watermark in place
//! and the next invocation repeats the work.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::zettelkasten::{IndexSummary, Zettelkasten};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexMode {
    Full,
    Incremental { since: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct ReindexOutcome {
    pub mode: ReindexMode,
    pub summary: IndexSummary,
    /// Watermark recorded in the config after this run.
    pub indexed_at: DateTime<Utc>,
}

pub async fn reindex(
    config: &mut Config,
    zk: &Zettelkasten,
    force_full: bool,
) -> Result<ReindexOutcome> {
    let mode = match config.last_indexed() {
        Some(since) if !force_full => ReindexMode::Incremental { since },
        _ => ReindexMode::Full,
    };
    let started_at = Utc::now();
    let chunk_size = config.chunking.chunk_size;
    let chunk_overlap = config.chunking.chunk_overlap;

    tracing::info!(?mode, chunk_size, chunk_overlap, "reindex starting");

    let summary = match mode {
        ReindexMode::Full => zk
            .chunk_and_index(chunk_size, chunk_overlap)
            .await
            .context("Full reindex failed")?,
        ReindexMode::Incremental { since } => zk
            .incremental_chunk_and_index(since, chunk_size, chunk_overlap)
            .await
            .context("Incremental reindex failed")?,
    };

    config.set_last_indexed(started_at);
    config.save()?;

    Ok(ReindexOutcome {
        mode,
        summary,
        indexed_at: started_at,
    })
}
