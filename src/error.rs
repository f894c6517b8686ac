//! Error types for the sequence filter

use std::fmt;

/// Custom error type for sequence filtering
#[derive(Debug, Clone)]
pub enum FilterError {
    /// E001: Sequence file unreadable or malformed
    DecodeError(String),
    /// E002: Sequence does not hold exactly two note-bearing tracks
    WrongTrackCount(usize),
    /// E003: A track has no events, so no end time can be derived
    EmptyTrack(String),
    /// E004: Encoding or writing an accepted sequence failed
    WriteError(String),
    /// E005: Input directory missing or not a directory
    InputDirMissing(String),
    /// E006: Output directory could not be created
    OutputDirError(String),
    /// E007: Configuration invalid or unreadable
    ConfigError(String),
    /// E008: Generic I/O failure
    IoError(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::DecodeError(msg) => {
                write!(f, "E001: Sequence decode error - {}", msg)
            }
            FilterError::WrongTrackCount(count) => {
                write!(f, "E002: Expected 2 tracks, found {}", count)
            }
            FilterError::EmptyTrack(role) => {
                write!(f, "E003: Track '{}' has no note events", role)
            }
            FilterError::WriteError(msg) => {
                write!(f, "E004: Sequence write error - {}", msg)
            }
            FilterError::InputDirMissing(dir) => {
                write!(f, "E005: Input directory not found - {}", dir)
            }
            FilterError::OutputDirError(msg) => {
                write!(f, "E006: Cannot prepare output directory - {}", msg)
            }
            FilterError::ConfigError(msg) => {
                write!(f, "E007: Configuration error - {}", msg)
            }
            FilterError::IoError(msg) => {
                write!(f, "E008: I/O error - {}", msg)
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl From<std::io::Error> for FilterError {
    fn from(err: std::io::Error) -> Self {
        FilterError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::ConfigError(format!("JSON error: {}", err))
    }
}

impl From<midly::Error> for FilterError {
    fn from(err: midly::Error) -> Self {
        FilterError::DecodeError(format!("SMF parse error: {}", err))
    }
}

impl From<anyhow::Error> for FilterError {
    fn from(err: anyhow::Error) -> Self {
        FilterError::ConfigError(err.to_string())
    }
}

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
