//! Public API for MMSeg CJK word segmentation
//!
//! This crate wraps the streaming [`mmseg_core::Segmentor`] in a
//! whole-document interface: decode the input, drive the segmentor until the
//! stream is finished, and return tokens with their offsets and annotations.

#![warn(missing_docs)]

pub mod config;
pub mod dto;
pub mod error;
pub mod writer;

use error::Result;
use log::debug;
use mmseg_core::dictionary::DictionaryManager;
use mmseg_core::{SegmentStatus, Segmentor};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export key types
pub use config::{Config, ConfigBuilder};
pub use dto::{ByteSource, Input, Metadata, Output, Token, TokenAnnotation};
pub use error::ApiError;
#[cfg(feature = "json")]
pub use writer::JsonWriter;
pub use writer::{SegmentWriter, TextWriter};

/// Main entry point for word segmentation
///
/// Holds one configured [`Segmentor`]; every call allocates its own
/// [`SegmentStatus`], so a `Segmenter` can serve many threads at once.
#[derive(Debug)]
pub struct Segmenter {
    segmentor: Segmentor,
    config: Config,
    next_task: AtomicU64,
}

/// Tallies of one driven stream
struct StreamSummary {
    tags: String,
    tokens: usize,
    blocks: usize,
}

impl StreamSummary {
    fn metadata(&self, total_bytes: usize, elapsed: Duration) -> Metadata {
        Metadata::measured(
            total_bytes,
            self.tags.chars().count(),
            self.tokens,
            self.blocks,
            elapsed,
        )
    }
}

impl Segmenter {
    /// Create a segmenter with default configuration
    pub fn new(dict_mgr: Arc<dyn DictionaryManager>) -> Result<Self> {
        Self::with_config(dict_mgr, Config::default())
    }

    /// Create a segmenter with custom configuration
    pub fn with_config(dict_mgr: Arc<dyn DictionaryManager>, config: Config) -> Result<Self> {
        let segmentor = Segmentor::new(dict_mgr)?;
        Self::from_segmentor(segmentor, config)
    }

    /// Wrap an existing segmentor, e.g. one sharing a frequency table
    pub fn from_segmentor(mut segmentor: Segmentor, config: Config) -> Result<Self> {
        config.encoding()?;
        let status = segmentor.create_status(config.segment_options().clone())?;
        segmentor.bind_annote(&status)?;
        debug!(
            "Segmenter configured: block capacity {}, encoding {}",
            config.segment_options().block_capacity,
            config.encoding_label()
        );
        Ok(Self {
            segmentor,
            config,
            next_task: AtomicU64::new(0),
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying streaming segmentor
    pub fn segmentor(&self) -> &Segmentor {
        &self.segmentor
    }

    /// Segment input and return tokens
    pub fn segment(&self, input: Input) -> Result<Output> {
        let text = input.read_text(self.config.encoding()?)?;
        self.segment_text(&text)
    }

    /// Segment text directly (convenience method)
    pub fn segment_text(&self, text: &str) -> Result<Output> {
        let start = Instant::now();
        let mut tokens = Vec::new();
        let summary = self.drive(text, &mut |token: Token| {
            tokens.push(token);
            Ok(())
        })?;
        let metadata = summary.metadata(text.len(), start.elapsed());
        Ok(Output {
            tokens,
            tags: summary.tags,
            metadata,
        })
    }

    /// Segment input straight into a writer, one block at a time
    pub fn segment_to(&self, input: Input, writer: &mut dyn SegmentWriter) -> Result<Metadata> {
        let text = input.read_text(self.config.encoding()?)?;
        let start = Instant::now();
        let summary = self.drive(&text, &mut |token: Token| writer.write_token(&token))?;
        writer.finish()?;
        Ok(summary.metadata(text.len(), start.elapsed()))
    }

    /// Segment independent documents on a thread pool
    ///
    /// Each document gets its own stream state; results keep input order.
    #[cfg(feature = "parallel")]
    pub fn segment_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<Output>> {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads().unwrap_or_else(num_cpus::get))
            .thread_name(|i| format!("mmseg-worker-{i}"))
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build thread pool: {e}")))?;

        debug!(
            "Segmenting {} documents on {} threads",
            texts.len(),
            pool.current_num_threads()
        );

        pool.install(|| {
            texts
                .par_iter()
                .map(|text| self.segment_text(text.as_ref()))
                .collect()
        })
    }

    /// Segment independent documents one after another
    #[cfg(not(feature = "parallel"))]
    pub fn segment_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Output>> {
        texts
            .iter()
            .map(|text| self.segment_text(text.as_ref()))
            .collect()
    }

    /// Run one stream to completion, handing every finished token to `sink`
    fn drive(
        &self,
        text: &str,
        sink: &mut dyn FnMut(Token) -> Result<()>,
    ) -> Result<StreamSummary> {
        let task_id = self.next_task.fetch_add(1, Ordering::Relaxed);
        let mut status = self
            .segmentor
            .create_status(self.config.segment_options().clone())?;
        let mut assembler = TokenAssembler::default();
        let mut blocks = 0;

        let mut next = Some(text);
        loop {
            self.segmentor.tokenize(task_id, next.take(), &mut status)?;
            blocks += 1;
            assembler.collect(&status, sink)?;
            if status.is_finished() {
                break;
            }
        }

        Ok(StreamSummary {
            tags: assembler.tags,
            tokens: assembler.tokens,
            blocks,
        })
    }
}

/// Groups tagged characters into tokens across block swaps
#[derive(Default)]
struct TokenAssembler {
    /// Byte offset of the next character in the decoded text
    byte_offset: usize,
    tags: String,
    tokens: usize,
}

impl TokenAssembler {
    fn collect(
        &mut self,
        status: &SegmentStatus,
        sink: &mut dyn FnMut(Token) -> Result<()>,
    ) -> Result<()> {
        let base = status.stream_offset();
        let first = status.emitted_range().start;

        let mut text = String::new();
        let mut start = first;
        let mut start_byte = self.byte_offset;
        for (pos, (c, tag)) in (first..).zip(status.emitted()) {
            if text.is_empty() {
                start = pos;
                start_byte = self.byte_offset;
            }
            text.push(c);
            self.byte_offset += c.len_utf8();
            self.tags.push(tag.as_char());

            if tag.closes_token() {
                let char_len = pos + 1 - start;
                let annotations = status
                    .annotations_for(start, char_len as u16)
                    .map(|(prop_id, annotation)| TokenAnnotation {
                        prop_id,
                        dict_id: annotation.dict_id,
                        value: annotation.as_text().into_owned(),
                    })
                    .collect();
                self.tokens += 1;
                sink(Token {
                    text: std::mem::take(&mut text),
                    byte_offset: start_byte,
                    char_offset: base + start,
                    char_len,
                    annotations,
                })?;
            }
        }
        Ok(())
    }
}
