//! Fill in embeddings for records that have none.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rusqlite::{Connection, TransactionBehavior};

use crate::embedding::EmbeddingProvider;
use crate::memory::store;

/// Outcome of [`embed_pending`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EmbedReport {
    pub embedded_count: usize,
    /// Records that gained an embedding elsewhere while this run was working.
    pub already_embedded: usize,
}

/// Embed every record whose embedding is NULL, `batch_size` messages at a time.
///
/// Each batch is written in its own transaction, so an interrupted run keeps
/// the batches it finished and the next run picks up the rest.
pub fn embed_pending(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<EmbedReport> {
    let pending = store::records_missing_embedding(conn)?;
    let mut report = EmbedReport::default();
    if pending.is_empty() {
        tracing::info!("no records waiting for an embedding");
        return Ok(report);
    }

    tracing::info!(count = pending.len(), "embedding pending records");
    progress.set_length(pending.len() as u64);

    for chunk in pending.chunks(batch_size.max(1)) {
        let texts: Vec<&str> = chunk.iter().map(|p| p.message.as_str()).collect();
        let embeddings = provider
            .embed_batch(&texts)
            .context("embedding batch failed")?;
        anyhow::ensure!(
            embeddings.len() == chunk.len(),
            "model returned {} embeddings for {} messages",
            embeddings.len(),
            chunk.len()
        );
        let expected_dim = provider.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected_dim) {
            anyhow::bail!(
                "model returned a {}-dimensional embedding, expected {expected_dim}",
                bad.len()
            );
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (record, embedding) in chunk.iter().zip(&embeddings) {
            if store::set_embedding(&tx, record.id, embedding)? {
                report.embedded_count += 1;
            } else {
                report.already_embedded += 1;
            }
        }
        tx.commit()?;
        progress.inc(chunk.len() as u64);
    }

    tracing::info!(embedded = report.embedded_count, "embedding complete");
    Ok(report)
}
