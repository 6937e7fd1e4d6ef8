//! Token writers

use crate::dto::Token;
use crate::error::Result;
use std::io::{self, Write};

/// Trait for token writers
pub trait SegmentWriter: Send {
    /// Write a single token
    fn write_token(&mut self, token: &Token) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

/// Plain text writer - `/x ` after every token
///
/// Whitespace and control characters are copied without a marker.
pub struct TextWriter<W: Write> {
    writer: W,
}

impl<W: Write> TextWriter<W> {
    /// Create a new text writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextWriter<io::Stdout> {
    /// Create a writer that writes to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> SegmentWriter for TextWriter<W> {
    fn write_token(&mut self, token: &Token) -> Result<()> {
        self.writer.write_all(token.text.as_bytes())?;
        let bare = token
            .text
            .chars()
            .last()
            .map_or(true, |c| c.is_whitespace() || c.is_control());
        if !bare {
            self.writer.write_all(b"/x ")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON writer - outputs tokens as a JSON array
#[cfg(feature = "json")]
pub struct JsonWriter<W: Write> {
    writer: W,
    tokens: Vec<Token>,
}

#[cfg(feature = "json")]
impl<W: Write> JsonWriter<W> {
    /// Create a new JSON writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            tokens: Vec::new(),
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(feature = "json")]
impl<W: Write + Send> SegmentWriter for JsonWriter<W> {
    fn write_token(&mut self, token: &Token) -> Result<()> {
        self.tokens.push(token.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.tokens)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
