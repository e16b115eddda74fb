use anyhow::{Context, Result};

use episodic::config::EpisodicConfig;
use episodic::db::schema;

/// Run a semantic search from the terminal.
pub fn search(config: &EpisodicConfig, query: &str, top_k: Option<usize>) -> Result<()> {
    let conn = episodic::db::open_database(config.resolved_db_path())?;
    let provider = episodic::embedding::create_provider(&config.embedding)
        .context("failed to load embedding model")?;

    if let Some(stored) = schema::get_embedding_model(&conn)? {
        if stored != config.embedding.model {
            tracing::warn!(
                stored = %stored,
                configured = %config.embedding.model,
                "stored embeddings come from a different model; scores may be meaningless"
            );
        }
    }

    let top_k = top_k.unwrap_or(config.search.default_top_k);
    println!("Searching for: {query} (semantic search)");
    let hits = episodic::memory::search::search(&conn, provider.as_ref(), query, top_k)?;

    if hits.is_empty() {
        println!("No embedded entries found to search. Run `episodic embed` first.");
        return Ok(());
    }

    println!("\nTop {} most similar entries:", hits.len());
    for hit in &hits {
        println!(
            "Similarity: {:.4} | [{}] {}",
            hit.score, hit.record.timestamp, hit.record.message
        );
    }
    Ok(())
}
