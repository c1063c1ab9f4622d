//! Offset table for the packed dictionary blob
//!
//! Entries are stored back to back with no terminators. Because every entry
//! in a band has the same length, a decoder only needs the first code and
//! blob offset of each band to find any entry:
//!
//! ```text
//! offset = band_start_offset + (code - band_start_index) * band_len
//! ```
//!
//! The running offset starts at [`RESERVED_CODES`] and the blob carries that
//! many padding bytes up front, so the single-character band is addressed
//! directly by its code.

use tracing::debug;

use crate::error::FbpError;
use crate::selector::Dictionary;
use crate::{BAND_SENTINEL, MAX_DICTIONARY_ENTRIES, RESERVED_CODES};

/// First code and blob offset of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandStart {
    pub index: u8,
    pub offset: usize,
}

/// Location of an entry's bytes in the packed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTable {
    tuple: Option<BandStart>,
    triple: Option<BandStart>,
    total_entries: usize,
    total_bytes: usize,
}

impl OffsetTable {
    /// Build the table for a length-sorted dictionary.
    pub fn build(dictionary: &Dictionary) -> Self {
        Self::layout(dictionary.entries().iter().map(|e| e.sequence.len()))
    }

    /// Build the table from entry lengths in code order.
    ///
    /// Rejects more than 253 entries, lengths outside `1..=3`, and lengths
    /// that are not grouped in ascending order.
    pub fn from_lengths<I>(lengths: I) -> Result<Self, FbpError>
    where
        I: IntoIterator<Item = usize>,
    {
        let lengths: Vec<usize> = lengths.into_iter().collect();
        if lengths.len() > MAX_DICTIONARY_ENTRIES {
            return Err(FbpError::InvalidBundle(format!(
                "{} entries exceeds the {} code limit",
                lengths.len(),
                MAX_DICTIONARY_ENTRIES
            )));
        }
        if lengths.iter().any(|len| !(1..=3).contains(len)) {
            return Err(FbpError::InvalidBundle("entry length outside 1..=3".into()));
        }
        if lengths.windows(2).any(|w| w[0] > w[1]) {
            return Err(FbpError::InvalidBundle("entries not grouped by length".into()));
        }
        Ok(Self::layout(lengths))
    }

    // Callers guarantee at most 253 entries of length 1..=3, sorted.
    fn layout<I>(lengths: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut tuple = None;
        let mut triple = None;
        let mut total_entries = 0;
        let mut offset = RESERVED_CODES as usize;

        for (i, len) in lengths.into_iter().enumerate() {
            let start = BandStart {
                index: Dictionary::code_of(i),
                offset,
            };
            match len {
                2 if tuple.is_none() => tuple = Some(start),
                3 if triple.is_none() => triple = Some(start),
                _ => {}
            }
            offset += len;
            total_entries += 1;
        }

        let table = Self {
            tuple,
            triple,
            total_entries,
            total_bytes: offset,
        };
        debug!(
            tuple_start_index = table.tuple_start_index(),
            triple_start_index = table.triple_start_index(),
            tuple_start_offset = table.tuple_start_offset(),
            triple_start_offset = table.triple_start_offset(),
            total_bytes = table.total_bytes,
            "offset table built"
        );
        table
    }

    /// First tuple code, or 255 when there are no tuples.
    pub fn tuple_start_index(&self) -> u8 {
        self.tuple.map_or(BAND_SENTINEL, |b| b.index)
    }

    /// First triple code, or 255 when there are no triples.
    pub fn triple_start_index(&self) -> u8 {
        self.triple.map_or(BAND_SENTINEL, |b| b.index)
    }

    pub fn tuple_start_offset(&self) -> usize {
        self.tuple.map_or(0, |b| b.offset)
    }

    pub fn triple_start_offset(&self) -> usize {
        self.triple.map_or(0, |b| b.offset)
    }

    pub fn tuple_band(&self) -> Option<BandStart> {
        self.tuple
    }

    pub fn triple_band(&self) -> Option<BandStart> {
        self.triple
    }

    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    /// Reserved prefix plus every entry's bytes; the packed blob length.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Resolve a dictionary code to its bytes in the packed blob.
    ///
    /// Returns `None` for control codes and codes past the last entry.
    pub fn locate(&self, code: u8) -> Option<Span> {
        if code < RESERVED_CODES || code as usize >= RESERVED_CODES as usize + self.total_entries {
            return None;
        }

        let (start, len) = if let Some(band) = self.triple.filter(|b| code >= b.index) {
            (band, 3)
        } else if let Some(band) = self.tuple.filter(|b| code >= b.index) {
            (band, 2)
        } else {
            let singles = BandStart {
                index: RESERVED_CODES,
                offset: RESERVED_CODES as usize,
            };
            (singles, 1)
        };

        Some(Span {
            offset: start.offset + (code - start.index) as usize * len,
            len,
        })
    }
}

/// Concatenate entries behind the reserved prefix.
pub fn pack<'a, I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut blob = vec![0u8; RESERVED_CODES as usize];
    for bytes in entries {
        blob.extend_from_slice(bytes);
    }
    blob
}
