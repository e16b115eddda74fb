//! CLI `embed` command: generate embeddings for records that lack one.

use anyhow::{Context, Result};

use episodic::config::EpisodicConfig;
use episodic::db::{self, schema};
use episodic::embedding;
use episodic::memory::embed::embed_pending;

pub fn embed(config: &EpisodicConfig) -> Result<()> {
    let mut conn = db::open_database(config.resolved_db_path())?;

    let provider = embedding::create_provider(&config.embedding)
        .context("failed to load embedding model")?;

    let stored_model = schema::get_embedding_model(&conn)?;
    if let Some(ref stored) = stored_model {
        if stored != &config.embedding.model {
            tracing::warn!(
                stored = %stored,
                configured = %config.embedding.model,
                "existing embeddings were produced by a different model; search scores will mix models"
            );
        }
    }

    let pb = super::bar(0, "  {bar:40.cyan/blue} {pos}/{len} ({eta})");
    let report = embed_pending(&mut conn, provider.as_ref(), config.embedding.batch_size, &pb)?;
    pb.finish_and_clear();

    if report.embedded_count == 0 {
        println!("No new entries to embed.");
        return Ok(());
    }

    if stored_model.is_none() {
        schema::set_embedding_model(&conn, &config.embedding.model)?;
    }
    println!(
        "Embedded {} message(s) with model '{}'.",
        report.embedded_count, config.embedding.model
    );
    Ok(())
}
