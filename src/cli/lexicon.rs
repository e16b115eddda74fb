//! CLI `lexicon` subcommands.

use anyhow::Result;

use episodic::config::EpisodicConfig;
use episodic::memory::lexicon;

pub fn build(config: &EpisodicConfig) -> Result<()> {
    let mut conn = episodic::db::open_database(config.resolved_db_path())?;
    println!("Building lexicon...");
    let report = lexicon::build_lexicon(&mut conn)?;
    println!(
        "Lexicon built with {} unique words from {} messages.",
        report.unique_words, report.messages_scanned
    );
    Ok(())
}

pub fn search(config: &EpisodicConfig, word: &str) -> Result<()> {
    let conn = episodic::db::open_database(config.resolved_db_path())?;
    match lexicon::search_lexicon(&conn, word)? {
        Some(frequency) => println!("Word '{word}' found with frequency: {frequency}"),
        None => println!("Word '{word}' not found in lexicon."),
    }
    Ok(())
}
