//! CLI `build` command: ingest new log files into the database.

use anyhow::Result;
use std::path::Path;

use episodic::config::EpisodicConfig;
use episodic::memory::ingest;

pub fn build(config: &EpisodicConfig, dir: &Path) -> Result<()> {
    let mut conn = episodic::db::open_database(config.resolved_db_path())?;

    println!("Scanning {} for {} files...", dir.display(), config.ingest.log_file_name);
    let report = ingest::build(&mut conn, dir, &config.ingest.log_file_name)?;

    println!("  Log files found:     {}", report.files_scanned);
    println!("  Already processed:   {}", report.files_skipped);
    println!("  Files added:         {}", report.files_added);
    println!("  Messages added:      {}", report.records_added);
    if report.duplicates > 0 {
        println!("  Duplicates skipped:  {}", report.duplicates);
    }
    if report.skipped_entries > 0 {
        println!("  Unusable entries:    {}", report.skipped_entries);
    }

    if !report.failures.is_empty() {
        println!();
        println!("Could not process {} file(s):", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
    }

    if report.records_added == 0 && report.failures.is_empty() {
        println!("No new messages. Your memory is up to date.");
    }
    Ok(())
}
