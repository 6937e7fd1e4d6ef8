//! Segmentation options carried by a [`SegmentStatus`](crate::SegmentStatus)

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default number of real character slots per block
pub const DEFAULT_BLOCK_CAPACITY: usize = 4096;

/// Minimum number of trailing real positions never used as a scan start
pub const RESERVED_TAIL: usize = 2;

/// Options that shape one segmentation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Semicolon-separated dictionary column names to annotate tokens with
    pub columns: String,
    /// Annotation property id per column name
    pub annotation_ids: HashMap<String, u16>,
    /// Real character slots per block
    pub block_capacity: usize,
    /// Fold input to lower case before dictionary lookup
    pub lowercase: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            columns: String::new(),
            annotation_ids: HashMap::new(),
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            lowercase: true,
        }
    }
}

impl SegmentOptions {
    /// Parse options from TOML
    pub fn from_toml_str(toml_str: &str) -> ConfigResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ConfigError::InvalidOptions(format!("failed to parse options: {e}")))
    }

    /// Read options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidOptions(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Annotate tokens with `column`, reported under `prop_id`
    pub fn with_annotation(mut self, column: &str, prop_id: u16) -> Self {
        if !self.column_names().any(|c| c == column) {
            if !self.columns.is_empty() {
                self.columns.push(';');
            }
            self.columns.push_str(column);
        }
        self.annotation_ids.insert(column.to_string(), prop_id);
        self
    }

    /// Column names listed in [`columns`](Self::columns)
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Property id assigned to a column; unassigned columns map to 0
    pub fn annotation_id(&self, column: &str) -> u16 {
        self.annotation_ids.get(column).copied().unwrap_or(0)
    }

    /// Number of trailing positions held back for lookahead
    pub fn lookahead_reserve(max_term_len: usize) -> usize {
        RESERVED_TAIL.max(3 * max_term_len)
    }

    /// Check that a block can hold the lookahead reserve and still advance
    pub fn validate(&self, max_term_len: usize) -> ConfigResult<()> {
        let reserve = Self::lookahead_reserve(max_term_len);
        if self.block_capacity <= reserve {
            return Err(ConfigError::BlockCapacity {
                capacity: self.block_capacity,
                reserve,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SegmentOptions::default();
        assert_eq!(options.block_capacity, DEFAULT_BLOCK_CAPACITY);
        assert!(options.lowercase);
        assert_eq!(options.column_names().count(), 0);
    }

    #[test]
    fn test_options_deserialize() {
        let toml_str = r#"
            columns = "pinyin; thesaurus"
            block_capacity = 64
            lowercase = false

            [annotation_ids]
            pinyin = 1
            thesaurus = 2
        "#;

        let options = SegmentOptions::from_toml_str(toml_str).unwrap();
        assert_eq!(
            options.column_names().collect::<Vec<_>>(),
            vec!["pinyin", "thesaurus"]
        );
        assert_eq!(options.annotation_id("thesaurus"), 2);
        assert_eq!(options.annotation_id("missing"), 0);
        assert_eq!(options.block_capacity, 64);
        assert!(!options.lowercase);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options = SegmentOptions::from_toml_str("block_capacity = 128").unwrap();
        assert_eq!(options.block_capacity, 128);
        assert!(options.lowercase);
    }

    #[test]
    fn test_invalid_toml() {
        let err = SegmentOptions::from_toml_str("block_capacity = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptions(_)));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "columns = \"pinyin\"").unwrap();
        let options = SegmentOptions::from_file(file.path()).unwrap();
        assert_eq!(options.column_names().collect::<Vec<_>>(), vec!["pinyin"]);
    }

    #[test]
    fn test_with_annotation_does_not_duplicate() {
        let options = SegmentOptions::default()
            .with_annotation("pinyin", 1)
            .with_annotation("thesaurus", 2)
            .with_annotation("pinyin", 3);
        assert_eq!(options.columns, "pinyin;thesaurus");
        assert_eq!(options.annotation_id("pinyin"), 3);
    }

    #[test]
    fn test_validate_capacity_against_reserve() {
        let options = SegmentOptions {
            block_capacity: 12,
            ..Default::default()
        };
        assert_eq!(SegmentOptions::lookahead_reserve(0), RESERVED_TAIL);
        assert_eq!(SegmentOptions::lookahead_reserve(4), 12);
        assert!(options.validate(3).is_ok());
        assert_eq!(
            options.validate(4),
            Err(ConfigError::BlockCapacity {
                capacity: 12,
                reserve: 12
            })
        );
    }
}
