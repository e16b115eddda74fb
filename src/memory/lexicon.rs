//! Corpus-wide word frequencies over stored messages.
//!
//! Tokens are Unicode words (UAX #29 word boundaries) lowercased, so
//! punctuation never sticks to a word and `"Hello,"` counts as `hello`.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, TransactionBehavior};
use unicode_segmentation::UnicodeSegmentation;

use crate::memory::store;

/// Outcome of [`build_lexicon`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LexiconReport {
    pub messages_scanned: usize,
    pub unique_words: usize,
}

/// Split text into lowercase word tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(str::to_lowercase)
}

/// Count token occurrences across `messages`.
pub fn count_words<'a>(messages: impl IntoIterator<Item = &'a str>) -> HashMap<String, u64> {
    let mut frequencies: HashMap<String, u64> = HashMap::new();
    for message in messages {
        for word in tokenize(message) {
            *frequencies.entry(word).or_default() += 1;
        }
    }
    frequencies
}

/// Rebuild the lexicon table from every stored message.
///
/// The table is cleared and refilled in one transaction, so repeated builds
/// over the same records produce identical frequencies.
pub fn build_lexicon(conn: &mut Connection) -> Result<LexiconReport> {
    let messages = store::all_messages(conn)?;
    let frequencies = count_words(messages.iter().map(String::as_str));

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    store::clear_lexicon(&tx)?;
    for (word, frequency) in &frequencies {
        store::upsert_lexicon(&tx, word, *frequency)?;
    }
    tx.commit()?;

    tracing::info!(
        messages = messages.len(),
        words = frequencies.len(),
        "lexicon rebuilt"
    );
    Ok(LexiconReport {
        messages_scanned: messages.len(),
        unique_words: frequencies.len(),
    })
}

/// Frequency of `word`, tokenized the same way as at build time.
///
/// `None` means the word is not in the lexicon, or the query is not exactly
/// one word once punctuation is stripped.
pub fn search_lexicon(conn: &Connection, word: &str) -> Result<Option<u64>> {
    let mut tokens = tokenize(word);
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => store::get_lexicon(conn, &token),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_case() {
        let tokens: Vec<String> = tokenize("Hello, World! (don't) panic...").collect();
        assert_eq!(tokens, vec!["hello", "world", "don't", "panic"]);
    }

    #[test]
    fn tokenize_empty_and_symbols() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("  -- !! ?? ").count(), 0);
    }

    #[test]
    fn counts_accumulate_across_messages() {
        let counts = count_words(["hello world", "Hello there"]);
        assert_eq!(counts["hello"], 2);
        assert_eq!(counts["world"], 1);
        assert_eq!(counts["there"], 1);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let conn = crate::db::open_memory_database().unwrap();
        store::upsert_lexicon(&conn, "rust", 3).unwrap();
        assert_eq!(search_lexicon(&conn, "  RuSt ").unwrap(), Some(3));
        assert_eq!(search_lexicon(&conn, "go").unwrap(), None);
    }

    #[test]
    fn lookup_strips_punctuation_like_the_build() {
        let mut conn = crate::db::open_memory_database().unwrap();
        for (id, message) in ["Hello, world", "hello!"].iter().enumerate() {
            store::insert_record(
                &conn,
                &crate::memory::types::NewRecord {
                    timestamp: String::new(),
                    session_id: "s".into(),
                    message_id: id.to_string(),
                    message: message.to_string(),
                    source_file: "/logs/logs.json".into(),
                },
            )
            .unwrap();
        }
        build_lexicon(&mut conn).unwrap();

        assert_eq!(search_lexicon(&conn, "hello,").unwrap(), Some(2));
        assert_eq!(search_lexicon(&conn, "\"World\"").unwrap(), Some(1));
        assert_eq!(search_lexicon(&conn, "hello world").unwrap(), None);
        assert_eq!(search_lexicon(&conn, "?!").unwrap(), None);
    }
}
