//! Data Transfer Objects for API

use crate::error::{ApiError, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Document to segment
///
/// Text is used as is. Every other source is read to the end and decoded,
/// with the input's own encoding when one was given and the configured
/// encoding otherwise.
#[derive(Debug)]
pub enum Input {
    /// Already decoded text
    Text(String),
    /// Bytes that still need decoding
    Encoded {
        /// Where the bytes come from
        source: ByteSource,
        /// Overrides the configured encoding
        encoding: Option<&'static Encoding>,
    },
}

/// Origin of encoded input
pub enum ByteSource {
    /// File on disk
    File(PathBuf),
    /// Bytes already in memory
    Bytes(Vec<u8>),
    /// Any reader, drained on use
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::File(path) => write!(f, "File({})", path.display()),
            ByteSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ByteSource::Reader(_) => f.write_str("Reader"),
        }
    }
}

impl ByteSource {
    fn read_all(self) -> Result<Vec<u8>> {
        match self {
            ByteSource::File(path) if path.is_dir() => Err(ApiError::InvalidInput(format!(
                "{} is a directory",
                path.display()
            ))),
            ByteSource::File(path) => Ok(fs::read(path)?),
            ByteSource::Bytes(bytes) => Ok(bytes),
            ByteSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<ByteSource> for Input {
    fn from(source: ByteSource) -> Self {
        Input::Encoded {
            source,
            encoding: None,
        }
    }
}

impl Input {
    /// Bytes of a file, decoded on use
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ByteSource::File(path.into()).into()
    }

    /// Bytes in memory, decoded on use
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ByteSource::Bytes(bytes.into()).into()
    }

    /// Everything a reader yields, decoded on use
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        ByteSource::Reader(Box::new(reader)).into()
    }

    /// Decode this input with the encoding named by `label`
    ///
    /// Has no effect on [`Input::Text`].
    pub fn with_encoding(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ApiError::Encoding(format!("unknown encoding `{label}`")))?;
        Ok(match self {
            Input::Encoded { source, .. } => Input::Encoded {
                source,
                encoding: Some(encoding),
            },
            text => text,
        })
    }

    /// Text content, decoding bytes with `fallback` unless the input names
    /// its own encoding
    ///
    /// A byte-order mark wins over both. Malformed byte sequences are an
    /// error rather than being replaced.
    pub fn read_text(self, fallback: &'static Encoding) -> Result<String> {
        match self {
            Input::Text(text) => Ok(text),
            Input::Encoded { source, encoding } => {
                decode(&source.read_all()?, encoding.unwrap_or(fallback))
            }
        }
    }
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ApiError::Encoding(format!(
            "input is not valid {}",
            used.name()
        )));
    }
    Ok(decoded.into_owned())
}

/// Annotation value attached to a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAnnotation {
    /// Property id configured for the source column
    pub prop_id: u16,
    /// Dictionary that supplied the value
    pub dict_id: u16,
    /// Column value
    pub value: String,
}

/// One segmented token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text as it appeared in the input
    pub text: String,
    /// Byte offset in the decoded text
    pub byte_offset: usize,
    /// Character offset in the decoded text
    pub char_offset: usize,
    /// Length in characters
    pub char_len: usize,
    /// Values of the bound dictionary columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<TokenAnnotation>,
}

/// Segmentation metadata with runtime statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Total bytes processed
    pub total_bytes: usize,
    /// Total characters processed
    pub total_chars: usize,
    /// Number of tokens produced
    pub total_tokens: usize,
    /// Number of blocks the stream was processed in
    pub blocks_processed: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Throughput in MB/s
    pub throughput_mbps: f64,
}

impl Metadata {
    /// Statistics of a run over `total_bytes` of decoded text that took `elapsed`
    pub fn measured(
        total_bytes: usize,
        total_chars: usize,
        total_tokens: usize,
        blocks_processed: usize,
        elapsed: Duration,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let megabytes = total_bytes as f64 / (1024.0 * 1024.0);
        Self {
            total_bytes,
            total_chars,
            total_tokens,
            blocks_processed,
            processing_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            throughput_mbps: if secs > 0.0 { megabytes / secs } else { 0.0 },
        }
    }
}

/// Complete output with tokens, tags and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Tokens in input order
    pub tokens: Vec<Token>,
    /// One `B`/`M`/`E`/`S` tag per character
    pub tags: String,
    /// Processing metadata
    pub metadata: Metadata,
}

impl Output {
    /// Token texts in input order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.as_str())
    }
}
