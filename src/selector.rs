//! Dictionary selection
//!
//! Merges the per-length frequency tables, ranks every sequence by count and
//! keeps the best `max_entries`, then regroups the survivors by length so the
//! offset table can address them without terminators.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FbpError;
use crate::scanner::FrequencyTables;
use crate::{MAX_DICTIONARY_ENTRIES, RESERVED_CODES};

/// A 1, 2 or 3 byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sequence {
    Single([u8; 1]),
    Tuple([u8; 2]),
    Triple([u8; 3]),
}

impl Sequence {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Sequence::Single(b) => b,
            Sequence::Tuple(b) => b,
            Sequence::Triple(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Always false; a sequence holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

// Lexicographic on the raw bytes, so "ab" sorts after "a" and before "b".
impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A sequence and how often it occurred in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCount {
    pub sequence: Sequence,
    pub count: u64,
}

/// Selection order: higher count first, ties broken by the larger sequence.
///
/// Sequences are unique after merging, so this is a total order.
pub fn rank_order(a: &SequenceCount, b: &SequenceCount) -> Ordering {
    (b.count, b.sequence).cmp(&(a.count, a.sequence))
}

/// Selected entries in code order: all singles, then tuples, then triples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: Vec<SequenceCount>,
}

impl Dictionary {
    pub fn entries(&self) -> &[SequenceCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code assigned to the entry at `index`
    pub fn code_of(index: usize) -> u8 {
        // select() caps the dictionary at 253 entries, so this never wraps
        (index + RESERVED_CODES as usize) as u8
    }

    /// Entries paired with their codes
    pub fn codes(&self) -> impl Iterator<Item = (u8, &SequenceCount)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (Self::code_of(i), entry))
    }
}

/// Merge, rank and truncate the frequency tables into a dictionary.
pub fn select(tables: FrequencyTables, max_entries: usize) -> Result<Dictionary, FbpError> {
    if max_entries == 0 || max_entries > MAX_DICTIONARY_ENTRIES {
        return Err(FbpError::InvalidMaxEntries {
            requested: max_entries,
            limit: MAX_DICTIONARY_ENTRIES,
        });
    }

    let mut merged = Vec::with_capacity(tables.distinct());
    merged.extend(tables.singles.into_iter().map(|(k, count)| SequenceCount {
        sequence: Sequence::Single(k),
        count,
    }));
    merged.extend(tables.tuples.into_iter().map(|(k, count)| SequenceCount {
        sequence: Sequence::Tuple(k),
        count,
    }));
    merged.extend(tables.triples.into_iter().map(|(k, count)| SequenceCount {
        sequence: Sequence::Triple(k),
        count,
    }));

    let candidates = merged.len();
    merged.sort_by(rank_order);
    merged.truncate(max_entries);

    // stable, so rank order survives within each length
    merged.sort_by_key(|entry| entry.sequence.len());

    debug!(
        candidates,
        selected = merged.len(),
        max_entries,
        "dictionary selected"
    );

    Ok(Dictionary { entries: merged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DictionaryConfig;
    use crate::scanner::scan;

    fn count(bytes: &[u8], count: u64) -> SequenceCount {
        let sequence = match bytes.len() {
            1 => Sequence::Single([bytes[0]]),
            2 => Sequence::Tuple([bytes[0], bytes[1]]),
            _ => Sequence::Triple([bytes[0], bytes[1], bytes[2]]),
        };
        SequenceCount { sequence, count }
    }

    #[test]
    fn test_rank_order_by_count() {
        let a = count(b"a", 6);
        let b = count(b"b", 3);
        assert_eq!(rank_order(&a, &b), Ordering::Less);
        assert_eq!(rank_order(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_rank_order_tie_break_on_sequence() {
        let a = count(b"a", 2);
        let ab = count(b"ab", 2);
        let b = count(b"b", 2);
        let mut ranked = vec![a, ab, b];
        ranked.sort_by(rank_order);
        let order: Vec<&[u8]> = ranked.iter().map(|e| e.sequence.as_bytes()).collect();
        assert_eq!(order, vec![&b"b"[..], &b"ab"[..], &b"a"[..]]);
        assert_eq!(rank_order(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_select_scenario() {
        let tables = scan(["aaa", "aaa", "bbb"], &DictionaryConfig::default());
        let dict = select(tables, 10).unwrap();
        let entries: Vec<(&[u8], u64)> = dict
            .entries()
            .iter()
            .map(|e| (e.sequence.as_bytes(), e.count))
            .collect();
        assert_eq!(
            entries,
            vec![(&b"a"[..], 6), (&b"b"[..], 3), (&b"aa"[..], 4), (&b"bb"[..], 2)]
        );
        let codes: Vec<u8> = dict.codes().map(|(code, _)| code).collect();
        assert_eq!(codes, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_truncation_keeps_highest_ranked() {
        let tables = scan(["aaa", "aaa", "bbb"], &DictionaryConfig::default());
        let dict = select(tables, 2).unwrap();
        let seqs: Vec<&[u8]> = dict.entries().iter().map(|e| e.sequence.as_bytes()).collect();
        // aa (4) outranks b (3), then grouping puts the single first
        assert_eq!(seqs, vec![&b"a"[..], &b"aa"[..]]);
    }

    #[test]
    fn test_length_grouping_is_stable() {
        let tables = scan(["abcdab", "abab"], &DictionaryConfig::default());
        let dict = select(tables, 253).unwrap();
        let lens: Vec<usize> = dict.entries().iter().map(|e| e.sequence.len()).collect();
        assert!(lens.windows(2).all(|w| w[0] <= w[1]));
        assert!(dict
            .entries()
            .windows(2)
            .filter(|w| w[0].sequence.len() == w[1].sequence.len())
            .all(|w| rank_order(&w[0], &w[1]) == Ordering::Less));
    }

    #[test]
    fn test_select_rejects_oversized() {
        let tables = scan(["abc"], &DictionaryConfig::default());
        assert!(matches!(
            select(tables, 300),
            Err(FbpError::InvalidMaxEntries { requested: 300, .. })
        ));
    }

    #[test]
    fn test_select_empty_tables() {
        let dict = select(FrequencyTables::default(), 253).unwrap();
        assert!(dict.is_empty());
    }
}
