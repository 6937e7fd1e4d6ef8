//! Per-stream segmentation state with double-buffered blocks

use crate::block::{fold_char, Block, PADDING};
use crate::dictionary::DictionaryManager;
use crate::error::Result;
use crate::options::{SegmentOptions, RESERVED_TAIL};
use crate::tag::SegTag;
use std::collections::BTreeMap;
use std::ops::Range;

/// Key of one annotation: token span and property
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationKey {
    /// Block position of the first character
    pub start: usize,
    /// Token length in characters
    pub len: u16,
    /// Property id configured for the source column
    pub prop_id: u16,
}

/// Side-channel value attached to an emitted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Dictionary that supplied the value
    pub dict_id: u16,
    /// Raw column bytes (UTF-8 for string columns)
    pub data: Vec<u8>,
}

impl Annotation {
    /// Value as text, replacing invalid UTF-8
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// State of one input stream
///
/// Owns two [`Block`]s used as ping-pong buffers. Raw text is decoded into the
/// active block on demand; when the scan reaches the lookahead reserve at the
/// end of a block, [`move_next`](Self::move_next) carries the unconsumed tail
/// into the other block so no token is ever split across blocks.
///
/// Annotations are keyed by positions of the active block and are dropped on
/// every block swap; read them after each call to
/// [`Segmentor::tokenize`](crate::Segmentor::tokenize).
#[derive(Debug, Clone)]
pub struct SegmentStatus {
    options: SegmentOptions,
    blocks: [Block; 2],
    active: usize,
    /// Next position of the active block to disambiguate
    scan_pos: usize,
    /// First position tagged by the latest disambiguation pass
    emitted_from: usize,
    /// Stream offset, in characters, of position 0 of the active block
    stream_offset: usize,
    input: String,
    /// Byte offset of the first undecoded character of `input`
    cursor: usize,
    input_closed: bool,
    reserve: usize,
    annotations: BTreeMap<AnnotationKey, Annotation>,
}

impl SegmentStatus {
    /// Allocate both blocks according to `options`
    pub fn new(options: SegmentOptions) -> Self {
        let capacity = options.block_capacity;
        Self {
            options,
            blocks: [Block::new(capacity), Block::new(capacity)],
            active: 0,
            scan_pos: 0,
            emitted_from: 0,
            stream_offset: 0,
            input: String::new(),
            cursor: 0,
            input_closed: true,
            reserve: RESERVED_TAIL,
            annotations: BTreeMap::new(),
        }
    }

    /// Options of this session
    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Clear both blocks, scan state, pending input and annotations
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
        self.active = 0;
        self.scan_pos = 0;
        self.emitted_from = 0;
        self.stream_offset = 0;
        self.input.clear();
        self.cursor = 0;
        self.input_closed = true;
        self.annotations.clear();
    }

    /// Record the complete text of a new stream; decoding happens on fill
    pub fn set_buffer(&mut self, text: &str) {
        self.input.clear();
        self.input.push_str(text);
        self.cursor = 0;
        self.input_closed = true;
    }

    /// Append text to an open stream
    ///
    /// Until [`finish_input`](Self::finish_input) is called, the lookahead
    /// reserve at the end of the decoded text is held back from scanning.
    pub fn push_text(&mut self, text: &str) {
        if self.cursor > 0 {
            self.input.drain(..self.cursor);
            self.cursor = 0;
        }
        self.input.push_str(text);
        self.input_closed = false;
    }

    /// Mark the stream as complete
    pub fn finish_input(&mut self) {
        self.input_closed = true;
    }

    pub(crate) fn set_lookahead_reserve(&mut self, reserve: usize) {
        self.reserve = reserve.max(RESERVED_TAIL);
    }

    /// Trailing positions held back while more input may follow
    pub fn lookahead_reserve(&self) -> usize {
        self.reserve
    }

    /// Real slots per block
    pub fn block_capacity(&self) -> usize {
        self.blocks[self.active].capacity()
    }

    /// Decode as many characters as fit into the active block
    ///
    /// Returns the number of characters filled, 0 when the block is full or
    /// the input is drained.
    pub fn fill_with_icode(&mut self, dict_mgr: &dyn DictionaryManager, lowercase: bool) -> usize {
        let mapper = dict_mgr.char_mapper();
        let block = &mut self.blocks[self.active];
        let mut filled = 0;
        for ch in self.input[self.cursor..].chars() {
            let code = u32::from(if lowercase { fold_char(ch) } else { ch });
            let class = mapper.transform(code);
            if !block.push(ch, code, class, mapper.seed(code, class)) {
                break;
            }
            self.cursor += ch.len_utf8();
            filled += 1;
        }
        filled
    }

    /// Populate the match list of the active block; returns the candidate count
    pub fn build_term_dag(&mut self, dict_mgr: &dyn DictionaryManager) -> usize {
        self.blocks[self.active].build_term_dag(dict_mgr)
    }

    /// Finalize the match index of the active block
    pub fn build_term_index(&mut self) -> Result<()> {
        self.blocks[self.active].build_term_index()
    }

    /// Carry the unscanned tail into the other block and make it active
    pub fn move_next(&mut self) {
        let from = self.scan_pos;
        let (src, dst) = if self.active == 0 {
            let [a, b] = &mut self.blocks;
            (&*a, b)
        } else {
            let [a, b] = &mut self.blocks;
            (&*b, a)
        };
        dst.copy_tail_from(src, from);
        self.stream_offset += from;
        self.active = 1 - self.active;
        self.blocks[1 - self.active].clear();
        self.scan_pos = 0;
        self.emitted_from = 0;
        self.annotations.clear();
    }

    /// Whether all input has been decoded and no more will arrive
    pub fn is_input_exhausted(&self) -> bool {
        self.input_closed && self.cursor == self.input.len()
    }

    /// Whether every character of the stream has received a final tag
    pub fn is_finished(&self) -> bool {
        self.is_input_exhausted() && self.scan_pos >= self.active_block().len()
    }

    /// Exclusive upper bound of positions that may start a scan step
    pub fn scan_limit(&self) -> usize {
        let filled = self.active_block().len();
        if self.is_input_exhausted() {
            filled
        } else {
            filled.saturating_sub(self.reserve)
        }
    }

    /// Exclusive bound a chunk's inner boundaries must stay below
    ///
    /// At the end of the stream the two end sentinels count as single-character
    /// terms, so a chunk can always be completed.
    pub fn horizon(&self) -> usize {
        let filled = self.active_block().len();
        if self.is_input_exhausted() {
            filled + PADDING
        } else {
            filled
        }
    }

    /// The block being scanned
    pub fn active_block(&self) -> &Block {
        &self.blocks[self.active]
    }

    pub(crate) fn active_block_mut(&mut self) -> &mut Block {
        &mut self.blocks[self.active]
    }

    /// Next position to disambiguate
    pub fn scan_position(&self) -> usize {
        self.scan_pos
    }

    pub(crate) fn begin_scan(&mut self) {
        self.emitted_from = self.scan_pos;
    }

    pub(crate) fn advance_to(&mut self, pos: usize) {
        debug_assert!(pos > self.scan_pos);
        self.scan_pos = pos;
    }

    /// Stream offset, in characters, of position 0 of the active block
    pub fn stream_offset(&self) -> usize {
        self.stream_offset
    }

    /// Positions tagged by the latest call
    pub fn emitted_range(&self) -> Range<usize> {
        self.emitted_from..self.scan_pos
    }

    /// Raw characters and final tags of the positions tagged by the latest call
    pub fn emitted(&self) -> impl Iterator<Item = (char, SegTag)> + '_ {
        let block = self.active_block();
        self.emitted_range()
            .filter_map(move |pos| block.tag(pos).map(|tag| (block.raw_char(pos), tag)))
    }

    /// Attach `data` to the token `start..start + len`
    ///
    /// An existing value for the same span and property is kept unless
    /// `overwrite` is set. Returns whether the value was stored.
    pub fn annotate_by_prop_id(
        &mut self,
        start: usize,
        len: u16,
        dict_id: u16,
        prop_id: u16,
        data: &[u8],
        overwrite: bool,
    ) -> bool {
        let key = AnnotationKey {
            start,
            len,
            prop_id,
        };
        if !overwrite && self.annotations.contains_key(&key) {
            return false;
        }
        self.annotations.insert(
            key,
            Annotation {
                dict_id,
                data: data.to_vec(),
            },
        );
        true
    }

    /// Annotations recorded for the active block, ordered by position
    pub fn annotations(&self) -> impl Iterator<Item = (&AnnotationKey, &Annotation)> {
        self.annotations.iter()
    }

    /// Annotations of the token starting at `start` with length `len`
    pub fn annotations_for(
        &self,
        start: usize,
        len: u16,
    ) -> impl Iterator<Item = (u16, &Annotation)> {
        let lo = AnnotationKey {
            start,
            len,
            prop_id: 0,
        };
        let hi = AnnotationKey {
            start,
            len,
            prop_id: u16::MAX,
        };
        self.annotations
            .range(lo..=hi)
            .map(|(key, value)| (key.prop_id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Code;
    use crate::dictionary::MemoryDictionaryManager;

    fn status(capacity: usize) -> SegmentStatus {
        SegmentStatus::new(SegmentOptions {
            block_capacity: capacity,
            ..Default::default()
        })
    }

    #[test]
    fn test_fill_stops_at_capacity() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(4);
        st.set_buffer("一二三四五六");
        assert_eq!(st.fill_with_icode(&mgr, true), 4);
        assert_eq!(st.fill_with_icode(&mgr, true), 0);
        assert!(!st.is_input_exhausted());
        assert_eq!(st.scan_limit(), 2);
        assert_eq!(st.horizon(), 4);
    }

    #[test]
    fn test_fill_folds_case_when_requested() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(8);
        st.set_buffer("Ab");
        st.fill_with_icode(&mgr, true);
        assert_eq!(st.active_block().code(0), Code::Char('a' as u32));
        assert_eq!(st.active_block().raw_char(0), 'A');

        st.reset();
        st.set_buffer("Ab");
        st.fill_with_icode(&mgr, false);
        assert_eq!(st.active_block().code(0), Code::Char('A' as u32));
    }

    #[test]
    fn test_exhausted_stream_scans_everything() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(8);
        st.set_buffer("一二三");
        st.fill_with_icode(&mgr, true);
        assert!(st.is_input_exhausted());
        assert_eq!(st.scan_limit(), 3);
        assert_eq!(st.horizon(), 5);
    }

    #[test]
    fn test_move_next_carries_tail() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(4);
        st.set_buffer("一二三四五六");
        st.fill_with_icode(&mgr, true);
        st.begin_scan();
        st.advance_to(2);

        st.move_next();
        assert_eq!(st.stream_offset(), 2);
        assert_eq!(st.scan_position(), 0);
        assert_eq!(st.active_block().raw_chars(), &['三', '四']);

        assert_eq!(st.fill_with_icode(&mgr, true), 2);
        assert_eq!(st.active_block().raw_chars(), &['三', '四', '五', '六']);
        assert!(st.is_input_exhausted());
    }

    #[test]
    fn test_push_text_holds_back_reserve() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(16);
        st.reset();
        st.push_text("一二三四五");
        st.fill_with_icode(&mgr, true);
        assert!(!st.is_input_exhausted());
        assert_eq!(st.scan_limit(), 3);

        st.finish_input();
        assert!(st.is_input_exhausted());
        assert_eq!(st.scan_limit(), 5);
    }

    #[test]
    fn test_annotation_overwrite_rules() {
        let mut st = status(8);
        assert!(st.annotate_by_prop_id(0, 2, 0, 1, b"guo ji", false));
        assert!(!st.annotate_by_prop_id(0, 2, 1, 1, b"other", false));
        assert_eq!(st.annotations_for(0, 2).next().unwrap().1.data, b"guo ji");

        assert!(st.annotate_by_prop_id(0, 2, 1, 1, b"other", true));
        let (prop, value) = st.annotations_for(0, 2).next().unwrap();
        assert_eq!(prop, 1);
        assert_eq!(value.dict_id, 1);
        assert_eq!(value.as_text(), "other");
    }

    #[test]
    fn test_annotations_for_filters_span() {
        let mut st = status(8);
        st.annotate_by_prop_id(0, 2, 0, 2, b"b", false);
        st.annotate_by_prop_id(0, 2, 0, 1, b"a", false);
        st.annotate_by_prop_id(2, 2, 0, 1, b"c", false);
        let props: Vec<u16> = st.annotations_for(0, 2).map(|(p, _)| p).collect();
        assert_eq!(props, vec![1, 2]);
        assert_eq!(st.annotations().count(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mgr = MemoryDictionaryManager::new();
        let mut st = status(8);
        st.set_buffer("一二");
        st.fill_with_icode(&mgr, true);
        st.annotate_by_prop_id(0, 1, 0, 1, b"x", false);
        st.reset();
        assert!(st.active_block().is_empty());
        assert_eq!(st.annotations().count(), 0);
        assert!(st.is_finished());
    }
}
