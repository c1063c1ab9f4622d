//! fbp-compress: fixed byte pair dictionary compression for line-oriented text.
//!
//! Builds a dictionary of at most 253 one, two and three byte sequences from
//! a corpus and encodes each line as a byte stream of dictionary codes and
//! literal escapes. Aimed at targets where the decoder and dictionary must
//! fit in a few hundred bytes of flash.
//!
//! Stream bytes are interpreted as:
//! - `0x00` end of line
//! - `0x01` literal run, followed by a length byte and that many bytes
//! - `0x02` single literal byte follows
//! - anything else indexes the dictionary
//!
//! Dictionary entries are grouped by length so the packed blob needs no
//! terminators; see [`offsets`].

pub mod codec;
pub mod config;
pub mod error;
pub mod offsets;
pub mod registry;
pub mod scanner;
pub mod selector;

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use crate::codec::{Codec, CorpusEncoding, EncodingStats};
pub use crate::config::{DictionaryConfig, TripleWindow};
pub use crate::error::FbpError;
pub use crate::offsets::OffsetTable;
pub use crate::registry::DictionaryRegistry;
pub use crate::selector::{Dictionary, Sequence, SequenceCount};

/// Control codes 0, 1 and 2 are never assigned to entries.
pub const RESERVED_CODES: u8 = 3;
pub const END_OF_STRING: u8 = 0;
pub const LITERAL_RUN: u8 = 1;
pub const LITERAL_BYTE: u8 = 2;
/// Start index of a band with no entries.
pub const BAND_SENTINEL: u8 = 255;
pub const MAX_DICTIONARY_ENTRIES: usize = 256 - RESERVED_CODES as usize;

/// A dictionary entry as handed to emission layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub code: u8,
    pub bytes: Vec<u8>,
    pub count: u64,
}

/// Everything an emitter needs to write out a dictionary and its decoder
/// constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryBundle {
    pub entries: Vec<DictionaryEntry>,
    pub tuple_start_index: u8,
    pub triple_start_index: u8,
    pub tuple_start_offset: usize,
    pub triple_start_offset: usize,
    pub total_entries: usize,
    pub total_bytes: usize,
    pub reserved_codes: u8,
}

impl DictionaryBundle {
    /// Lay out a selected dictionary for emission
    pub fn new(dictionary: &Dictionary) -> Self {
        let table = OffsetTable::build(dictionary);
        let entries = dictionary
            .codes()
            .map(|(code, entry)| DictionaryEntry {
                code,
                bytes: entry.sequence.as_bytes().to_vec(),
                count: entry.count,
            })
            .collect();

        Self {
            entries,
            tuple_start_index: table.tuple_start_index(),
            triple_start_index: table.triple_start_index(),
            tuple_start_offset: table.tuple_start_offset(),
            triple_start_offset: table.triple_start_offset(),
            total_entries: table.total_entries(),
            total_bytes: table.total_bytes(),
            reserved_codes: RESERVED_CODES,
        }
    }

    /// Recompute the offset table from the entries and check it against the
    /// stored constants.
    pub fn offset_table(&self) -> Result<OffsetTable, FbpError> {
        if let Some((i, entry)) = self
            .entries
            .iter()
            .enumerate()
            .find(|(i, e)| i + RESERVED_CODES as usize != e.code as usize)
        {
            return Err(FbpError::InvalidBundle(format!(
                "entry {} advertises code {} but sits at code {}",
                i,
                entry.code,
                i + RESERVED_CODES as usize
            )));
        }

        let table = OffsetTable::from_lengths(self.entries.iter().map(|e| e.bytes.len()))?;
        let consistent = self.reserved_codes == RESERVED_CODES
            && self.tuple_start_index == table.tuple_start_index()
            && self.triple_start_index == table.triple_start_index()
            && self.tuple_start_offset == table.tuple_start_offset()
            && self.triple_start_offset == table.triple_start_offset()
            && self.total_entries == table.total_entries()
            && self.total_bytes == table.total_bytes();
        if !consistent {
            return Err(FbpError::InvalidBundle("offset constants do not match entries".into()));
        }
        Ok(table)
    }

    /// The packed blob: reserved padding followed by every entry's bytes.
    pub fn packed_blob(&self) -> Vec<u8> {
        offsets::pack(self.entries.iter().map(|e| e.bytes.as_slice()))
    }

    /// True when the corpus produced no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON for templating layers
    pub fn to_json(&self) -> Result<String, FbpError> {
        serde_json::to_string_pretty(self).map_err(|e| FbpError::SerializationError(e.to_string()))
    }

    /// Parse a bundle written by [`DictionaryBundle::to_json`]
    pub fn from_json(json: &str) -> Result<Self, FbpError> {
        serde_json::from_str(json).map_err(|e| FbpError::SerializationError(e.to_string()))
    }

    /// Compact binary image for caching a compiled dictionary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FbpError> {
        bincode::serialize(self).map_err(|e| FbpError::SerializationError(e.to_string()))
    }

    /// Load a binary image written by [`DictionaryBundle::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FbpError> {
        bincode::deserialize(bytes).map_err(|e| FbpError::SerializationError(e.to_string()))
    }
}

/// Builds dictionaries from line-oriented corpora.
pub struct DictionaryCompiler {
    config: DictionaryConfig,
}

impl Default for DictionaryCompiler {
    fn default() -> Self {
        Self::new(DictionaryConfig::default())
    }
}

impl DictionaryCompiler {
    /// Create a compiler with the given configuration
    pub fn new(config: DictionaryConfig) -> Self {
        Self { config }
    }

    /// Configuration used for every compile
    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Scan, select and lay out a dictionary for the given lines.
    pub fn compile<I, S>(&self, lines: I) -> Result<DictionaryBundle, FbpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.validate()?;

        let tables = scanner::scan(lines, &self.config);
        let dictionary = selector::select(tables, self.config.max_entries)?;
        let bundle = DictionaryBundle::new(&dictionary);

        info!(
            entries = bundle.total_entries,
            total_bytes = bundle.total_bytes,
            tuple_start_index = bundle.tuple_start_index,
            triple_start_index = bundle.triple_start_index,
            "dictionary compiled"
        );
        Ok(bundle)
    }

    /// Compile from a reader, one line per `\n`. Read errors abort.
    pub fn compile_reader<R: BufRead>(&self, reader: R) -> Result<DictionaryBundle, FbpError> {
        self.config.validate()?;
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        self.compile(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_scenario() {
        let compiler = DictionaryCompiler::default();
        let bundle = compiler.compile(["aaa", "aaa", "bbb"]).unwrap();
        assert_eq!(bundle.total_entries, 4);
        assert_eq!(bundle.entries[0].bytes, b"a");
        assert_eq!(bundle.entries[0].code, 3);
        assert_eq!(bundle.entries[1].bytes, b"b");
        assert_eq!(bundle.tuple_start_index, 5);
        assert_eq!(bundle.triple_start_index, 255);
        assert_eq!(bundle.reserved_codes, 3);
    }

    #[test]
    fn test_compile_rejects_before_scanning() {
        let compiler = DictionaryCompiler::new(DictionaryConfig {
            max_entries: 300,
            ..DictionaryConfig::default()
        });
        let result = compiler.compile(["abc"]);
        assert!(matches!(result, Err(FbpError::InvalidMaxEntries { .. })));
    }

    #[test]
    fn test_compile_all_comments() {
        let compiler = DictionaryCompiler::default();
        let bundle = compiler.compile(["# one", "# two"]).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(bundle.tuple_start_index, BAND_SENTINEL);
        assert_eq!(bundle.triple_start_index, BAND_SENTINEL);
        assert_eq!(bundle.total_bytes, RESERVED_CODES as usize);
        assert_eq!(bundle.packed_blob(), vec![0, 0, 0]);
    }

    #[test]
    fn test_offset_table_detects_tampering() {
        let compiler = DictionaryCompiler::default();
        let mut bundle = compiler.compile(["hello world"]).unwrap();
        assert!(bundle.offset_table().is_ok());
        bundle.total_bytes += 1;
        assert!(matches!(bundle.offset_table(), Err(FbpError::InvalidBundle(_))));
    }

    #[test]
    fn test_offset_table_rejects_swapped_codes() {
        let mut bundle = DictionaryCompiler::default()
            .compile(["aaa", "aaa", "bbb"])
            .unwrap();
        bundle.entries[0].code = 4;
        bundle.entries[1].code = 3;
        assert!(matches!(bundle.offset_table(), Err(FbpError::InvalidBundle(_))));
        assert!(Codec::new(&bundle).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let bundle = DictionaryCompiler::default().compile(["abcabc"]).unwrap();
        let json = bundle.to_json().unwrap();
        assert!(json.contains("\"tuple_start_index\""));
        assert_eq!(DictionaryBundle::from_json(&json).unwrap(), bundle);
    }

    #[test]
    fn test_bincode_roundtrip() {
        let bundle = DictionaryCompiler::default().compile(["abcabc", "cab"]).unwrap();
        let bytes = bundle.to_bytes().unwrap();
        assert_eq!(DictionaryBundle::from_bytes(&bytes).unwrap(), bundle);
        assert!(DictionaryBundle::from_bytes(&bytes[..2]).is_err());
    }
}
