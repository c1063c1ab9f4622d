//! Line encoder and decoder for compiled dictionaries
//!
//! The encoder takes the longest dictionary match at each position (three
//! bytes, then two, then one). Bytes with no match are gathered into literal
//! runs so that a stretch of unknown text costs two bytes of overhead rather
//! than one per byte.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::DictionaryConfig;
use crate::error::FbpError;
use crate::offsets::OffsetTable;
use crate::scanner::prepare_line;
use crate::selector::Dictionary;
use crate::{DictionaryBundle, END_OF_STRING, LITERAL_BYTE, LITERAL_RUN};

const MAX_LITERAL_RUN: usize = u8::MAX as usize;

/// Encoded size statistics for a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingStats {
    pub lines: usize,
    /// Line bytes plus one terminator per line
    pub original_bytes: usize,
    pub encoded_bytes: usize,
    pub dictionary_bytes: usize,
}

impl EncodingStats {
    /// Percentage saved by encoding, ignoring the dictionary itself
    pub fn savings_pct(&self) -> f64 {
        Self::savings(self.original_bytes, self.encoded_bytes)
    }

    /// Percentage saved once the dictionary blob is counted against the output
    pub fn savings_with_dictionary_pct(&self) -> f64 {
        Self::savings(self.original_bytes, self.encoded_bytes + self.dictionary_bytes)
    }

    fn savings(original: usize, encoded: usize) -> f64 {
        if original == 0 {
            return 0.0;
        }
        100.0 - (encoded as f64 / original as f64) * 100.0
    }
}

#[derive(Debug, Clone)]
pub struct CorpusEncoding {
    pub lines: Vec<Vec<u8>>,
    pub stats: EncodingStats,
}

pub struct Codec {
    blob: Vec<u8>,
    table: OffsetTable,
    singles: HashMap<u8, u8>,
    tuples: HashMap<[u8; 2], u8>,
    triples: HashMap<[u8; 3], u8>,
}

impl Codec {
    /// Build lookup tables by reading every entry back out of the packed blob.
    pub fn new(bundle: &DictionaryBundle) -> Result<Self, FbpError> {
        let table = bundle.offset_table()?;
        let blob = bundle.packed_blob();
        let mut singles = HashMap::new();
        let mut tuples = HashMap::new();
        let mut triples = HashMap::new();

        for index in 0..table.total_entries() {
            let code = Dictionary::code_of(index);
            let bytes = table
                .locate(code)
                .and_then(|span| blob.get(span.range()))
                .ok_or_else(|| FbpError::InvalidBundle(format!("code {} outside blob", code)))?;
            let previous = match *bytes {
                [a] => singles.insert(a, code),
                [a, b] => tuples.insert([a, b], code),
                [a, b, c] => triples.insert([a, b, c], code),
                _ => None,
            };
            if previous.is_some() {
                return Err(FbpError::InvalidBundle(format!(
                    "duplicate entry {:?}",
                    String::from_utf8_lossy(bytes)
                )));
            }
        }

        Ok(Self {
            blob,
            table,
            singles,
            tuples,
            triples,
        })
    }

    pub fn offset_table(&self) -> &OffsetTable {
        &self.table
    }

    fn find_match(&self, rest: &[u8]) -> Option<(u8, usize)> {
        if let [a, b, c, ..] = *rest {
            if let Some(&code) = self.triples.get(&[a, b, c]) {
                return Some((code, 3));
            }
        }
        if let [a, b, ..] = *rest {
            if let Some(&code) = self.tuples.get(&[a, b]) {
                return Some((code, 2));
            }
        }
        rest.first()
            .and_then(|a| self.singles.get(a))
            .map(|&code| (code, 1))
    }

    /// Encode a line, terminator included.
    pub fn encode_line(&self, line: &str) -> Vec<u8> {
        self.encode_bytes(line.as_bytes())
    }

    pub fn encode_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len() + 1);
        let mut literal_start = None;
        let mut pos = 0;

        while pos < bytes.len() {
            match self.find_match(&bytes[pos..]) {
                Some((code, len)) => {
                    if let Some(start) = literal_start.take() {
                        push_literal(&mut out, &bytes[start..pos]);
                    }
                    out.push(code);
                    pos += len;
                }
                None => {
                    literal_start.get_or_insert(pos);
                    pos += 1;
                }
            }
        }
        if let Some(start) = literal_start {
            push_literal(&mut out, &bytes[start..]);
        }

        out.push(END_OF_STRING);
        out
    }

    /// Decode one line from the front of `encoded`.
    ///
    /// Returns the decoded bytes and how many stream bytes were consumed,
    /// terminator included.
    pub fn decode(&self, encoded: &[u8]) -> Result<(Vec<u8>, usize), FbpError> {
        let mut out = Vec::new();
        let mut pos = 0;

        loop {
            let Some(&byte) = encoded.get(pos) else {
                return Err(FbpError::MissingTerminator);
            };
            pos += 1;

            match byte {
                END_OF_STRING => return Ok((out, pos)),
                LITERAL_RUN => {
                    let len = *encoded.get(pos).ok_or(FbpError::Truncated {
                        position: pos,
                        reason: "missing literal run length",
                    })? as usize;
                    pos += 1;
                    let run = encoded.get(pos..pos + len).ok_or(FbpError::Truncated {
                        position: pos,
                        reason: "literal run shorter than its length",
                    })?;
                    trace!(len, "literal run");
                    out.extend_from_slice(run);
                    pos += len;
                }
                LITERAL_BYTE => {
                    let literal = *encoded.get(pos).ok_or(FbpError::Truncated {
                        position: pos,
                        reason: "missing literal byte",
                    })?;
                    out.push(literal);
                    pos += 1;
                }
                code => {
                    let span = self.table.locate(code).ok_or(FbpError::UnknownCode {
                        code,
                        position: pos - 1,
                    })?;
                    trace!(code, offset = span.offset, len = span.len, "dictionary entry");
                    out.extend_from_slice(&self.blob[span.range()]);
                }
            }
        }
    }

    pub fn decode_line(&self, encoded: &[u8]) -> Result<String, FbpError> {
        let (bytes, _) = self.decode(encoded)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Decode a stream of back to back encoded lines.
    pub fn decode_all(&self, mut encoded: &[u8]) -> Result<Vec<String>, FbpError> {
        let mut lines = Vec::new();
        while !encoded.is_empty() {
            let (bytes, consumed) = self.decode(encoded)?;
            lines.push(String::from_utf8(bytes)?);
            encoded = &encoded[consumed..];
        }
        Ok(lines)
    }

    /// Encode a line into a caller buffer.
    ///
    /// Returns the length the full encoding needs, terminator included. When
    /// that exceeds `dst.len()` the output stops at the last whole token that
    /// still leaves room for a terminator, so the truncated stream is valid.
    /// An empty buffer receives nothing.
    pub fn encode_into(&self, dst: &mut [u8], line: &str) -> usize {
        let encoded = self.encode_line(line);
        if encoded.len() <= dst.len() {
            dst[..encoded.len()].copy_from_slice(&encoded);
            return encoded.len();
        }
        if dst.is_empty() {
            return encoded.len();
        }

        let mut written = 0;
        while written < encoded.len() {
            let token_len = match encoded[written] {
                LITERAL_RUN => 2 + encoded[written + 1] as usize,
                LITERAL_BYTE => 2,
                _ => 1,
            };
            if written + token_len + 1 > dst.len() {
                break;
            }
            dst[written..written + token_len]
                .copy_from_slice(&encoded[written..written + token_len]);
            written += token_len;
        }
        dst[written] = END_OF_STRING;
        encoded.len()
    }

    /// Decode one line into a caller buffer as a NUL-terminated string.
    ///
    /// Returns the length the full line needs, terminator included. A short
    /// buffer is filled with as many bytes as fit followed by a terminator.
    /// An empty buffer receives nothing.
    pub fn decode_into(&self, dst: &mut [u8], encoded: &[u8]) -> Result<usize, FbpError> {
        let (bytes, _) = self.decode(encoded)?;
        let required = bytes.len() + 1;
        if let Some(room) = dst.len().checked_sub(1) {
            let copied = room.min(bytes.len());
            dst[..copied].copy_from_slice(&bytes[..copied]);
            dst[copied] = END_OF_STRING;
        }
        Ok(required)
    }

    /// Encode every line of a corpus, skipping comments and blank lines.
    pub fn encode_corpus<I, S>(&self, lines: I, config: &DictionaryConfig) -> CorpusEncoding
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoded = Vec::new();
        let mut stats = EncodingStats {
            dictionary_bytes: self.table.total_bytes(),
            ..EncodingStats::default()
        };

        for raw in lines {
            let Some(line) = prepare_line(raw.as_ref(), config) else {
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            let bytes = self.encode_line(line);
            stats.lines += 1;
            stats.original_bytes += line.len() + 1;
            stats.encoded_bytes += bytes.len();
            encoded.push(bytes);
        }

        debug!(
            lines = stats.lines,
            original_bytes = stats.original_bytes,
            encoded_bytes = stats.encoded_bytes,
            savings_pct = stats.savings_pct(),
            savings_with_dictionary_pct = stats.savings_with_dictionary_pct(),
            "corpus encoded"
        );

        CorpusEncoding {
            lines: encoded,
            stats,
        }
    }
}

fn push_literal(out: &mut Vec<u8>, run: &[u8]) {
    for chunk in run.chunks(MAX_LITERAL_RUN) {
        if let [byte] = *chunk {
            out.push(LITERAL_BYTE);
            out.push(byte);
        } else {
            out.push(LITERAL_RUN);
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
    }
}
