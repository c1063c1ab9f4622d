//! Configuration for fbp-compress

use serde::{Deserialize, Serialize};

use crate::error::FbpError;
use crate::MAX_DICTIONARY_ENTRIES;

/// Which starting positions produce length-3 sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TripleWindow {
    /// Starts at `0..len-3`, two positions short of the last valid triple.
    /// Dictionaries generated before `Full` existed were built this way.
    #[default]
    Legacy,
    /// Every contiguous triple, starts at `0..len-2`.
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Strip leading and trailing whitespace from each line before scanning.
    pub trim: bool,
    /// Lines starting with this marker are ignored. Empty disables skipping.
    pub comment_marker: String,
    pub max_entries: usize,
    pub triple_window: TripleWindow,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            trim: true,
            comment_marker: "#".to_string(),
            max_entries: MAX_DICTIONARY_ENTRIES,
            triple_window: TripleWindow::Legacy,
        }
    }
}

impl DictionaryConfig {
    /// Reject a dictionary size that would spill into the reserved codes.
    pub fn validate(&self) -> Result<(), FbpError> {
        if self.max_entries == 0 || self.max_entries > MAX_DICTIONARY_ENTRIES {
            return Err(FbpError::InvalidMaxEntries {
                requested: self.max_entries,
                limit: MAX_DICTIONARY_ENTRIES,
            });
        }
        Ok(())
    }

    pub(crate) fn is_comment(&self, line: &str) -> bool {
        !self.comment_marker.is_empty() && line.starts_with(self.comment_marker.as_str())
    }
}
