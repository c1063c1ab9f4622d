//! Error types for fbp-compress

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FbpError {
    #[error("invalid max entries {requested}: must be between 1 and {limit}")]
    InvalidMaxEntries { requested: usize, limit: usize },

    #[error("truncated stream at byte {position}: {reason}")]
    Truncated { position: usize, reason: &'static str },

    #[error("code {code:#04x} at byte {position} is not in the dictionary")]
    UnknownCode { code: u8, position: usize },

    #[error("encoded stream has no end-of-string marker")]
    MissingTerminator,

    #[error("decoded bytes are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid dictionary bundle: {0}")]
    InvalidBundle(String),

    #[error("unknown dictionary: {0}")]
    UnknownDictionary(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}
