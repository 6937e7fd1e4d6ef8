//! Layered error types
//!
//! Configuration errors are raised once, while a [`Segmentor`](crate::Segmentor)
//! is being set up. Segment errors are invariant violations detected while a
//! block is being disambiguated; they indicate a defect, not a transient
//! condition, and are never retried.

use thiserror::Error;

/// Setup-time configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The base dictionary used for character frequencies is not loaded
    #[error("dictionary `{name}` not found")]
    MissingBaseDictionary {
        /// Well-known name that was looked up
        name: String,
    },

    /// A dictionary lacks a column the segmentor depends on
    #[error("dictionary `{dictionary}` has no column `{column}`")]
    MissingColumn {
        /// Dictionary name
        dictionary: String,
        /// Column name
        column: String,
    },

    /// A column exists but holds the wrong kind of data
    #[error("column `{column}` has type `{found}`, expected {expected}")]
    ColumnType {
        /// Column name
        column: String,
        /// Declared datatype code
        found: char,
        /// Human readable description of the accepted types
        expected: &'static str,
    },

    /// The base dictionary is loaded under an id reserved for user dictionaries
    #[error("dictionary `{name}` has id {found}, must be loaded first as id {expected}")]
    BaseDictionaryId {
        /// Well-known name of the base dictionary
        name: String,
        /// Id the manager assigned
        found: u16,
        /// Id reserved for the base dictionary
        expected: u16,
    },

    /// A field marker references a dictionary the manager does not hold
    #[error("dictionary id {dict_id} out of range ({count} dictionaries loaded)")]
    DictionaryOutOfRange {
        /// Offending dictionary id
        dict_id: u16,
        /// Number of loaded dictionaries
        count: usize,
    },

    /// Block capacity cannot hold the lookahead reserve
    #[error("block capacity {capacity} must exceed the lookahead reserve of {reserve}")]
    BlockCapacity {
        /// Configured capacity
        capacity: usize,
        /// Required reserve
        reserve: usize,
    },

    /// Options could not be parsed
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Errors raised while segmenting a stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// Configuration error surfaced through the segmentation path
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The match index references entries outside the active block
    #[error("match index corrupted at position {position}")]
    CorruptMatchIndex {
        /// Position whose range is invalid
        position: usize,
    },

    /// A match entry points at a record the dictionary cannot resolve
    #[error("dictionary {dict_id} has no entry at offset {offset}")]
    MissingEntry {
        /// Dictionary id
        dict_id: u16,
        /// Entry offset
        offset: u32,
    },

    /// A full block yielded no scannable position
    #[error("block of {filled} characters made no progress")]
    NoProgress {
        /// Number of filled positions
        filled: usize,
    },
}

/// Result type for configuration steps
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for segmentation
pub type Result<T> = std::result::Result<T, SegmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingColumn {
            dictionary: "mmseg.base".into(),
            column: "freq".into(),
        };
        assert_eq!(err.to_string(), "dictionary `mmseg.base` has no column `freq`");
    }

    #[test]
    fn test_segment_error_from_config() {
        let err: SegmentError = ConfigError::DictionaryOutOfRange {
            dict_id: 9,
            count: 2,
        }
        .into();
        assert!(matches!(err, SegmentError::Config(_)));
        assert!(err.to_string().contains("out of range"));
    }
}
