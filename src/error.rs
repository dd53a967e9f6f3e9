//! Error types for patterndb.

use thiserror::Error;

/// Error type for patterndb operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying source failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preamble, header or record fails a structural check
    #[error("invalid data format at offset {offset}: {reason}")]
    InvalidFormat { reason: String, offset: u64 },

    /// Version tag is not 3.1 or 3.2
    #[error("unsupported data file version {major}.{minor}")]
    UnknownVersion { major: u16, minor: u16 },

    /// Entity key outside the section bounds
    #[error("index {index} out of range for section limit {limit}")]
    InvalidIndex { index: u32, limit: u32 },

    /// Invalid cache or pool configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation on a closed dataset
    #[error("dataset is closed")]
    Closed,
}

impl Error {
    /// Shorthand for a structural format violation at a known offset.
    pub(crate) fn format(reason: impl Into<String>, offset: u64) -> Self {
        Error::InvalidFormat {
            reason: reason.into(),
            offset,
        }
    }
}

/// Result type alias for patterndb operations.
pub type Result<T> = std::result::Result<T, Error>;
