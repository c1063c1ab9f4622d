//! Corpus scanner
//!
//! Counts every 1, 2 and 3 byte sequence inside each line of a corpus.
//! Sequences never cross a line boundary.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{DictionaryConfig, TripleWindow};

/// Occurrence counts keyed by a fixed-length byte sequence.
pub type FrequencyTable<const N: usize> = HashMap<[u8; N], u64>;

/// The three per-length tables produced by a scan.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTables {
    pub singles: FrequencyTable<1>,
    pub tuples: FrequencyTable<2>,
    pub triples: FrequencyTable<3>,
    pub lines_scanned: usize,
    pub lines_skipped: usize,
}

impl FrequencyTables {
    /// Number of distinct sequences across all three tables
    pub fn distinct(&self) -> usize {
        self.singles.len() + self.tuples.len() + self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct() == 0
    }
}

/// Apply comment skipping and optional trimming to a raw line.
///
/// Comments are detected on the raw line, before trimming, so an indented
/// marker does not make a line a comment.
pub fn prepare_line<'a>(raw: &'a str, config: &DictionaryConfig) -> Option<&'a str> {
    if config.is_comment(raw) {
        return None;
    }
    if config.trim {
        Some(raw.trim())
    } else {
        Some(raw)
    }
}

/// Scan a corpus into frequency tables.
pub fn scan<I, S>(lines: I, config: &DictionaryConfig) -> FrequencyTables
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tables = FrequencyTables::default();

    for raw in lines {
        let Some(line) = prepare_line(raw.as_ref(), config) else {
            tables.lines_skipped += 1;
            continue;
        };
        let bytes = line.as_bytes();
        let len = bytes.len();

        let triple_starts = match config.triple_window {
            TripleWindow::Legacy => len.saturating_sub(3),
            TripleWindow::Full => len.saturating_sub(2),
        };

        count_windows(&mut tables.singles, bytes, len);
        count_windows(&mut tables.tuples, bytes, len.saturating_sub(1));
        count_windows(&mut tables.triples, bytes, triple_starts);
        tables.lines_scanned += 1;
    }

    debug!(
        lines_scanned = tables.lines_scanned,
        lines_skipped = tables.lines_skipped,
        singles = tables.singles.len(),
        tuples = tables.tuples.len(),
        triples = tables.triples.len(),
        "corpus scanned"
    );

    tables
}

fn count_windows<const N: usize>(table: &mut FrequencyTable<N>, bytes: &[u8], starts: usize) {
    for window in bytes.windows(N).take(starts) {
        let mut key = [0u8; N];
        key.copy_from_slice(window);
        *table.entry(key).or_insert(0) += 1;
    }
}
