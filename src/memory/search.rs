//! Brute-force cosine similarity search over stored embeddings.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::embedding::EmbeddingProvider;
use crate::memory::store;
use crate::memory::types::{EmbeddedRecord, Record};

/// A stored record and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: Record,
    pub score: f32,
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when either norm is zero or the lengths differ, so the
/// result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        dot / denom
    }
}

/// Score `candidates` against `query` and keep the best `top_k`.
///
/// Ties keep the order of `candidates`.
pub fn rank(query: &[f32], candidates: Vec<EmbeddedRecord>, top_k: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .map(|c| SearchHit {
            score: cosine_similarity(query, &c.embedding),
            record: c.record,
        })
        .collect();
    // stable: equal scores stay in insertion order
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(top_k);
    hits
}

/// Embed `query` and return the `top_k` most similar stored records, best first.
///
/// The provider must be the model that produced the stored vectors.
pub fn search(
    conn: &Connection,
    provider: &dyn EmbeddingProvider,
    query: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>> {
    let candidates = store::all_embedded_records(conn)?;
    if candidates.is_empty() {
        return Ok(vec![]);
    }
    let query_embedding = provider.embed(query).context("failed to embed query")?;
    tracing::debug!(candidates = candidates.len(), top_k, "scoring embedded records");
    Ok(rank(&query_embedding, candidates, top_k))
}
