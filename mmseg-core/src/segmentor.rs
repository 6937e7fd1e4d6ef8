//! Stream driver: fill, match, disambiguate

use crate::dictionary::DictionaryManager;
use crate::error::{ConfigError, ConfigResult, Result, SegmentError};
use crate::freq::FrequencyTable;
use crate::mmseg::MmsegPolicy;
use crate::options::SegmentOptions;
use crate::status::SegmentStatus;
use log::{debug, trace, warn};
use std::sync::Arc;

/// Segments character streams against a shared dictionary set
///
/// A segmentor is immutable while tokenizing and may be shared between
/// threads; all per-stream state lives in [`SegmentStatus`].
///
/// # Example
///
/// ```rust
/// use mmseg_core::dictionary::{
///     ColumnType, FieldValue, MemoryDictionary, MemoryDictionaryManager, Schema,
///     BASE_DICTIONARY_NAME, FREQ_COLUMN,
/// };
/// use mmseg_core::{SegmentOptions, Segmentor};
/// use std::sync::Arc;
///
/// let schema = Schema::new().with_column(FREQ_COLUMN, ColumnType::U32);
/// let mut base = MemoryDictionary::new(BASE_DICTIONARY_NAME, schema);
/// base.insert("国际", [(FREQ_COLUMN, FieldValue::U32(0))]).unwrap();
/// base.insert("组织", [(FREQ_COLUMN, FieldValue::U32(0))]).unwrap();
/// let mut mgr = MemoryDictionaryManager::new();
/// mgr.add(base).unwrap();
///
/// let segmentor = Segmentor::new(Arc::new(mgr)).unwrap();
/// let mut status = segmentor.create_status(SegmentOptions::default()).unwrap();
/// segmentor.tokenize(0, Some("国际组织"), &mut status).unwrap();
///
/// let tags: String = status.emitted().map(|(_, tag)| tag.as_char()).collect();
/// assert_eq!(tags, "BEBE");
/// ```
#[derive(Clone)]
pub struct Segmentor {
    dict_mgr: Arc<dyn DictionaryManager>,
    policy: MmsegPolicy,
    reserve: usize,
}

impl std::fmt::Debug for Segmentor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmentor")
            .field("dictionaries", &self.dict_mgr.dictionary_count())
            .field("reserve", &self.reserve)
            .finish()
    }
}

impl Segmentor {
    /// Build the frequency table from the base dictionary and create a segmentor
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the base dictionary or its `freq`
    /// column is missing.
    pub fn new(dict_mgr: Arc<dyn DictionaryManager>) -> ConfigResult<Self> {
        let freq = Arc::new(FrequencyTable::build(dict_mgr.as_ref())?);
        Ok(Self::with_frequency_table(dict_mgr, freq))
    }

    /// Create a segmentor that shares an already built frequency table
    pub fn with_frequency_table(
        dict_mgr: Arc<dyn DictionaryManager>,
        freq: Arc<FrequencyTable>,
    ) -> Self {
        let max_term_len = dict_mgr.max_term_len();
        let reserve = SegmentOptions::lookahead_reserve(max_term_len);
        debug!(
            "Segmentor ready: {} dictionaries, longest term {}, lookahead reserve {}",
            dict_mgr.dictionary_count(),
            max_term_len,
            reserve
        );
        Self {
            dict_mgr,
            policy: MmsegPolicy::new(freq),
            reserve,
        }
    }

    /// Dictionaries this segmentor reads
    pub fn dictionary_manager(&self) -> &Arc<dyn DictionaryManager> {
        &self.dict_mgr
    }

    /// Shared frequency table
    pub fn frequency_table(&self) -> &Arc<FrequencyTable> {
        self.policy.frequency_table()
    }

    /// Trailing positions of a block held back while more input may follow
    pub fn lookahead_reserve(&self) -> usize {
        self.reserve
    }

    /// Validate `options` against the loaded dictionaries and allocate a status
    pub fn create_status(&self, options: SegmentOptions) -> ConfigResult<SegmentStatus> {
        options.validate(self.dict_mgr.max_term_len())?;
        let mut status = SegmentStatus::new(options);
        status.set_lookahead_reserve(self.reserve);
        Ok(status)
    }

    /// Resolve the annotation columns listed in the options of `status`
    pub fn bind_annote(&mut self, status: &SegmentStatus) -> ConfigResult<()> {
        self.policy.bind_annote(self.dict_mgr.as_ref(), status)
    }

    /// Segment the next window of a stream
    ///
    /// `Some(text)` starts a new stream over `text`; `None` continues the
    /// current one after moving the unconsumed tail into the other block.
    /// Returns the number of positions tagged by this call; they are exposed
    /// through [`SegmentStatus::emitted`]. Call again with `None` until
    /// [`SegmentStatus::is_finished`] holds.
    ///
    /// # Errors
    ///
    /// Fails when the status block cannot hold the lookahead reserve, or when
    /// an internal invariant is violated.
    pub fn tokenize(
        &self,
        task_id: u64,
        text: Option<&str>,
        status: &mut SegmentStatus,
    ) -> Result<usize> {
        let capacity = status.block_capacity();
        if capacity <= self.reserve {
            return Err(SegmentError::Config(ConfigError::BlockCapacity {
                capacity,
                reserve: self.reserve,
            }));
        }
        status.set_lookahead_reserve(self.reserve);

        match text {
            Some(text) => {
                status.reset();
                status.set_buffer(text);
            }
            None => status.move_next(),
        }

        let dict_mgr = self.dict_mgr.as_ref();
        let lowercase = status.options().lowercase;
        let filled = status.fill_with_icode(dict_mgr, lowercase);
        let candidates = status.build_term_dag(dict_mgr);
        status.build_term_index()?;
        let tagged = self.policy.apply(dict_mgr, status)?;

        trace!(
            "task {}: filled {} (block {}), {} candidates, tagged {}",
            task_id,
            filled,
            status.active_block().len(),
            candidates,
            tagged
        );

        if tagged == 0 && !status.is_finished() {
            if status.active_block().is_full() {
                return Err(SegmentError::NoProgress {
                    filled: status.active_block().len(),
                });
            }
            warn!(
                "task {}: {} characters waiting for more input",
                task_id,
                status.active_block().len()
            );
        }
        Ok(tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{
        ColumnType, FieldValue, MemoryDictionary, MemoryDictionaryManager, Schema,
        BASE_DICTIONARY_NAME, FREQ_COLUMN,
    };
    use crate::tag::tags_to_string;

    fn segmentor() -> Segmentor {
        let schema = Schema::new().with_column(FREQ_COLUMN, ColumnType::U32);
        let mut base = MemoryDictionary::new(BASE_DICTIONARY_NAME, schema);
        for (term, freq) in [("国", 50), ("际", 30), ("国际", 0), ("组织", 0)] {
            base.insert(term, [(FREQ_COLUMN, FieldValue::U32(freq))]).unwrap();
        }
        let mut mgr = MemoryDictionaryManager::new();
        mgr.add(base).unwrap();
        Segmentor::new(Arc::new(mgr)).unwrap()
    }

    fn emitted_tags(status: &SegmentStatus) -> String {
        let tags: Vec<_> = status.emitted().map(|(_, tag)| tag).collect();
        tags_to_string(&tags)
    }

    #[test]
    fn test_single_call_segments_whole_text() {
        let seg = segmentor();
        let mut status = seg.create_status(SegmentOptions::default()).unwrap();
        assert_eq!(seg.tokenize(1, Some("国际组织"), &mut status).unwrap(), 4);
        assert_eq!(emitted_tags(&status), "BEBE");
        assert!(status.is_finished());
    }

    #[test]
    fn test_unmatched_character_is_single() {
        let seg = segmentor();
        let mut status = seg.create_status(SegmentOptions::default()).unwrap();
        seg.tokenize(1, Some("好"), &mut status).unwrap();
        assert_eq!(emitted_tags(&status), "S");
    }

    #[test]
    fn test_empty_text() {
        let seg = segmentor();
        let mut status = seg.create_status(SegmentOptions::default()).unwrap();
        assert_eq!(seg.tokenize(1, Some(""), &mut status).unwrap(), 0);
        assert!(status.is_finished());
    }

    #[test]
    fn test_reserve_follows_longest_term() {
        let seg = segmentor();
        assert_eq!(seg.lookahead_reserve(), 6);
        let err = seg
            .create_status(SegmentOptions {
                block_capacity: 6,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::BlockCapacity {
                capacity: 6,
                reserve: 6
            }
        );
    }

    #[test]
    fn test_tokenize_rejects_undersized_status() {
        let seg = segmentor();
        let mut status = SegmentStatus::new(SegmentOptions {
            block_capacity: 4,
            ..Default::default()
        });
        let err = seg.tokenize(1, Some("国际"), &mut status).unwrap_err();
        assert!(matches!(
            err,
            SegmentError::Config(ConfigError::BlockCapacity { .. })
        ));
    }

    #[test]
    fn test_continuation_across_blocks() {
        let seg = segmentor();
        let mut status = seg
            .create_status(SegmentOptions {
                block_capacity: 8,
                ..Default::default()
            })
            .unwrap();

        let mut tags = String::new();
        let text = "国际组织".repeat(3);
        let mut next = Some(text.as_str());
        loop {
            seg.tokenize(7, next.take(), &mut status).unwrap();
            tags.push_str(&emitted_tags(&status));
            if status.is_finished() {
                break;
            }
        }
        assert_eq!(tags, "BEBEBEBEBEBE");
    }

    #[test]
    fn test_shared_frequency_table() {
        let seg = segmentor();
        let other = Segmentor::with_frequency_table(
            seg.dictionary_manager().clone(),
            seg.frequency_table().clone(),
        );
        assert!(Arc::ptr_eq(seg.frequency_table(), other.frequency_table()));
    }
}
