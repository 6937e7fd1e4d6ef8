//! High-level configuration API

use crate::error::{ApiError, Result};
use encoding_rs::Encoding;
use mmseg_core::SegmentOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// High-level configuration for segmentation
///
/// Deserializes from TOML:
///
/// ```toml
/// encoding = "gbk"
/// threads = 4
///
/// [segment]
/// columns = "pinyin"
/// block_capacity = 8192
///
/// [segment.annotation_ids]
/// pinyin = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    segment: SegmentOptions,
    encoding: String,
    threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment: SegmentOptions::default(),
            encoding: "utf-8".to_string(),
            threads: None,
        }
    }
}

impl Config {
    /// Create a builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ApiError::Configuration(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Options handed to each segmentation session
    pub fn segment_options(&self) -> &SegmentOptions {
        &self.segment
    }

    /// Thread count for batch segmentation; `None` uses every core
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Label of the encoding used to decode byte input
    pub fn encoding_label(&self) -> &str {
        &self.encoding
    }

    /// Encoding used to decode byte input
    pub fn encoding(&self) -> Result<&'static Encoding> {
        lookup_encoding(&self.encoding)
    }

    fn validate(&self) -> Result<()> {
        lookup_encoding(&self.encoding)?;
        if self.threads == Some(0) {
            return Err(ApiError::Configuration(
                "thread count must be positive".to_string(),
            ));
        }
        if self.segment.block_capacity == 0 {
            return Err(ApiError::Configuration(
                "block capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ApiError::Configuration(format!("unknown encoding: {label}")))
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Annotate tokens with a dictionary column, reported under `prop_id`
    pub fn annotate(mut self, column: &str, prop_id: u16) -> Self {
        self.config.segment = self.config.segment.with_annotation(column, prop_id);
        self
    }

    /// Set the block capacity in characters
    pub fn block_capacity(mut self, capacity: usize) -> Self {
        self.config.segment.block_capacity = capacity;
        self
    }

    /// Enable or disable case folding before dictionary lookup
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.config.segment.lowercase = lowercase;
        self
    }

    /// Set the encoding of byte input
    pub fn encoding(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        lookup_encoding(&label)?;
        self.config.encoding = label;
        Ok(self)
    }

    /// Set thread count
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.config.threads = threads;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.encoding().unwrap(), encoding_rs::UTF_8);
        assert!(config.segment_options().lowercase);
    }

    #[test]
    fn test_builder_settings() {
        let config = Config::builder()
            .annotate("pinyin", 2)
            .block_capacity(256)
            .lowercase(false)
            .threads(Some(3))
            .encoding("GBK")
            .unwrap()
            .build()
            .unwrap();

        let options = config.segment_options();
        assert_eq!(options.columns, "pinyin");
        assert_eq!(options.annotation_id("pinyin"), 2);
        assert_eq!(options.block_capacity, 256);
        assert!(!options.lowercase);
        assert_eq!(config.threads(), Some(3));
        assert_eq!(config.encoding().unwrap(), encoding_rs::GBK);
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = Config::builder().encoding("klingon").unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(Config::builder().threads(Some(0)).build().is_err());
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            encoding = "gb18030"
            threads = 2

            [segment]
            columns = "pinyin;thesaurus"
            block_capacity = 1024

            [segment.annotation_ids]
            thesaurus = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.threads(), Some(2));
        assert_eq!(config.encoding().unwrap(), encoding_rs::GB18030);
        assert_eq!(config.segment_options().block_capacity, 1024);
        assert_eq!(config.segment_options().annotation_id("thesaurus"), 5);
        assert!(config.segment_options().lowercase);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(Config::from_toml_str("threads = 0").is_err());
        assert!(Config::from_toml_str("encoding = \"nope\"").is_err());
        assert!(Config::from_toml_str("threads = \"many\"").is_err());
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[segment]\nlowercase = false").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.segment_options().lowercase);

        let missing = Config::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ApiError::Io(_))));
    }
}
