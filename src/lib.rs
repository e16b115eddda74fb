//! Personal episodic memory built from conversation logs.
//!
//! Episodic ingests user messages from `logs.json` files into a single
//! SQLite database, attaches sentence embeddings to them, and answers
//! "what did I say about ..." queries by cosine similarity. A word-frequency
//! lexicon is maintained over the same text.
//!
//! # Architecture
//!
//! - **Storage**: one SQLite file; `(source_file, message_id)` is unique, so
//!   re-ingesting a file never duplicates rows
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   stored as little-endian `f32` blobs
//! - **Search**: exhaustive cosine similarity over every embedded record
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization and schema
//! - [`embedding`]: Text-to-vector embedding via ONNX Runtime
//! - [`memory`]: Ingest, embed, search, lexicon, and statistics

pub mod config;
pub mod db;
pub mod embedding;
pub mod memory;
