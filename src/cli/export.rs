//! CLI `export` command: dump every record as a chronological JSON array.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use episodic::config::EpisodicConfig;
use episodic::memory::store;
use episodic::memory::types::Record;

#[derive(Debug, Serialize)]
struct ExportedEpisode<'a> {
    timestamp: &'a str,
    session_id: &'a str,
    message_id: &'a str,
    message: &'a str,
    source_file: &'a str,
}

/// Write all records to `output`, or stdout when `None`.
pub fn export(config: &EpisodicConfig, output: Option<&Path>) -> Result<()> {
    let conn = episodic::db::open_database(config.resolved_db_path())?;
    let mut records = store::all_records(&conn)?;
    sort_chronologically(&mut records);

    let episodes: Vec<ExportedEpisode<'_>> = records
        .iter()
        .map(|r| ExportedEpisode {
            timestamp: &r.timestamp,
            session_id: &r.session_id,
            message_id: &r.message_id,
            message: &r.message,
            source_file: &r.source_file,
        })
        .collect();
    let json = serde_json::to_string_pretty(&episodes)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} entries to {}", episodes.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

/// Order by parsed RFC 3339 timestamp; unparseable timestamps sort first,
/// compared as text. Equal keys keep insertion order.
fn sort_chronologically(records: &mut [Record]) {
    records.sort_by_cached_key(|r| {
        let parsed = DateTime::parse_from_rfc3339(&r.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc));
        (parsed, r.timestamp.clone())
    });
}
