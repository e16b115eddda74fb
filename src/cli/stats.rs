use anyhow::Result;

use episodic::config::EpisodicConfig;

/// Display store statistics in the terminal.
pub fn stats(config: &EpisodicConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = episodic::db::open_database(&db_path)?;

    let response = episodic::memory::stats::memory_stats(&conn, Some(&db_path))?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Messages:            {}", response.total_records);
    println!("  Embedded:            {}", response.embedded_records);
    println!("  Awaiting embedding:  {}", response.pending_embeddings);
    println!("  Source files:        {}", response.source_files);
    println!("  Sessions:            {}", response.sessions);
    println!("  Lexicon words:       {}", response.lexicon_words);
    println!();
    println!("Database:              {}", db_path.display());
    println!("Database size:         {} bytes", response.db_size_bytes);
    println!("Schema version:        {}", response.schema_version);
    println!(
        "Embedding model:       {}",
        response.embedding_model.as_deref().unwrap_or("(none yet)")
    );

    if let Some(ref oldest) = response.oldest_timestamp {
        println!("Oldest message:        {oldest}");
    }
    if let Some(ref newest) = response.newest_timestamp {
        println!("Newest message:        {newest}");
    }

    Ok(())
}
