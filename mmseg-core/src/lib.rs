//! Dictionary-driven CJK word segmentation with the MMSeg rules
//!
//! The crate turns a character stream into one tag per character:
//! `S` for a single-character token, `B`/`M`/`E` for the begin, middle and
//! end of a longer one. Candidate terms come from a set of read-only
//! dictionaries; ambiguity is resolved by the four MMSeg rules over
//! three-term chunks.
//!
//! # Architecture
//!
//! - **Dictionary layer** ([`dictionary`]): read-only traits plus an
//!   in-memory reference implementation
//! - **Stream layer** ([`Block`], [`SegmentStatus`]): double-buffered
//!   windows with sentinel padding and a per-position match index
//! - **Policy layer** ([`mmseg`]): chunk enumeration and rule ordering
//! - **Driver** ([`Segmentor`]): fill, match and disambiguate one window per
//!   call
//!
//! # Example
//!
//! ```rust
//! use mmseg_core::dictionary::{
//!     ColumnType, FieldValue, MemoryDictionary, MemoryDictionaryManager, Schema,
//!     BASE_DICTIONARY_NAME, FREQ_COLUMN,
//! };
//! use mmseg_core::{SegmentOptions, Segmentor};
//! use std::sync::Arc;
//!
//! let schema = Schema::new().with_column(FREQ_COLUMN, ColumnType::U32);
//! let mut base = MemoryDictionary::new(BASE_DICTIONARY_NAME, schema);
//! base.insert("中国", [(FREQ_COLUMN, FieldValue::U32(10))]).unwrap();
//! let mut mgr = MemoryDictionaryManager::new();
//! mgr.add(base).unwrap();
//!
//! let segmentor = Segmentor::new(Arc::new(mgr)).unwrap();
//! let mut status = segmentor.create_status(SegmentOptions::default()).unwrap();
//!
//! let mut tags = String::new();
//! let mut text = Some("我爱中国");
//! loop {
//!     segmentor.tokenize(0, text.take(), &mut status).unwrap();
//!     tags.extend(status.emitted().map(|(_, tag)| tag.as_char()));
//!     if status.is_finished() {
//!         break;
//!     }
//! }
//! assert_eq!(tags, "SSBE");
//! ```

pub mod block;
pub mod char_class;
pub mod dictionary;
pub mod error;
pub mod freq;
pub mod mmseg;
pub mod options;
pub mod segmentor;
pub mod status;
pub mod tag;

pub use block::{Block, Code};
pub use char_class::{CharMapper, ScriptClass, UnicodeCharMapper};
pub use error::{ConfigError, ConfigResult, Result, SegmentError};
pub use freq::FrequencyTable;
pub use mmseg::{select_best_chunk, Chunk, MmsegPolicy};
pub use options::SegmentOptions;
pub use segmentor::Segmentor;
pub use status::{Annotation, AnnotationKey, SegmentStatus};
pub use tag::{SegTag, SeedTag};
