//! Fixed-capacity character window with sentinel padding
//!
//! A [`Block`] is one half of the double buffer owned by
//! [`SegmentStatus`](crate::SegmentStatus). It stores decoded characters in
//! parallel arrays (raw character, folded code, script class, seed tag,
//! final tag) together with the dictionary matches anchored at each
//! position. Two sentinel cells sit on each side of the real slots so every
//! lookback of one position and every lookahead past the last filled slot
//! resolves to an explicit [`Code::Begin`] or [`Code::End`].

use crate::char_class::ScriptClass;
use crate::dictionary::{DictMatchEntry, DictionaryManager};
use crate::error::{Result, SegmentError};
use crate::tag::{SegTag, SeedTag};

/// Number of sentinel cells on each side of a block
pub const PADDING: usize = 2;

/// Content of one window cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// Sentinel before the first real cell
    Begin,
    /// Decoded, possibly case-folded, codepoint
    Char(u32),
    /// Sentinel after the last real cell
    End,
}

impl Code {
    /// Codepoint value for real cells
    pub fn value(self) -> Option<u32> {
        match self {
            Code::Char(c) => Some(c),
            Code::Begin | Code::End => None,
        }
    }

    /// Whether this is a sentinel
    pub fn is_sentinel(self) -> bool {
        !matches!(self, Code::Char(_))
    }
}

/// Lower-case a character when it folds to exactly one character
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Fixed-capacity window over the character stream
#[derive(Debug, Clone)]
pub struct Block {
    capacity: usize,
    filled: usize,
    /// `PADDING + capacity + PADDING` cells; sentinels are never overwritten
    codes: Vec<Code>,
    raw: Vec<char>,
    classes: Vec<ScriptClass>,
    seeds: Vec<SeedTag>,
    tags: Vec<Option<SegTag>>,
    /// Per-position candidate counts, written by `build_term_dag`
    match_counts: Vec<u32>,
    /// Prefix offsets into `matches`; position `i` owns `index[i]..index[i + 1]`
    match_index: Vec<u32>,
    matches: Vec<DictMatchEntry>,
}

impl Block {
    /// Allocate a block with `capacity` real slots
    pub fn new(capacity: usize) -> Self {
        let mut codes = vec![Code::End; capacity + 2 * PADDING];
        codes[..PADDING].fill(Code::Begin);
        Self {
            capacity,
            filled: 0,
            codes,
            raw: vec!['\0'; capacity],
            classes: vec![ScriptClass::OTHER; capacity],
            seeds: vec![SeedTag::Undetermined; capacity],
            tags: vec![None; capacity],
            match_counts: vec![0; capacity],
            match_index: vec![0; capacity + 1],
            matches: Vec::new(),
        }
    }

    /// Real slots available
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Filled real slots
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Whether no slot is filled
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Whether every slot is filled
    pub fn is_full(&self) -> bool {
        self.filled == self.capacity
    }

    /// Free slots
    pub fn remaining(&self) -> usize {
        self.capacity - self.filled
    }

    /// Reset to an empty window
    pub fn clear(&mut self) {
        self.codes[PADDING..PADDING + self.filled].fill(Code::End);
        self.tags[..self.filled].fill(None);
        self.match_counts[..self.filled].fill(0);
        self.match_index.fill(0);
        self.matches.clear();
        self.filled = 0;
    }

    /// Append a decoded character; returns `false` when the block is full
    pub fn push(&mut self, raw: char, code: u32, class: ScriptClass, seed: SeedTag) -> bool {
        if self.is_full() {
            return false;
        }
        let pos = self.filled;
        self.codes[PADDING + pos] = Code::Char(code);
        self.raw[pos] = raw;
        self.classes[pos] = class;
        self.seeds[pos] = seed;
        self.tags[pos] = None;
        self.filled += 1;
        true
    }

    /// Copy the cells `from..other.len()` of `other` into this (cleared) block
    ///
    /// Tags and matches are not carried; they are recomputed once the block
    /// is refilled.
    pub fn copy_tail_from(&mut self, other: &Block, from: usize) {
        self.clear();
        for pos in from..other.filled {
            let code = other.code(pos).value().unwrap_or_default();
            self.push(other.raw[pos], code, other.classes[pos], other.seeds[pos]);
        }
    }

    /// Cell content at `pos`; positions past the filled range are [`Code::End`]
    pub fn code(&self, pos: usize) -> Code {
        self.codes
            .get(PADDING + pos)
            .copied()
            .unwrap_or(Code::End)
    }

    /// Cell content one position before `pos`, [`Code::Begin`] at the start
    /// and [`Code::End`] past the trailing sentinels
    pub fn preceding(&self, pos: usize) -> Code {
        self.codes
            .get(PADDING - 1 + pos)
            .copied()
            .unwrap_or(Code::End)
    }

    /// Raw (unfolded) character at a filled position
    pub fn raw_char(&self, pos: usize) -> char {
        self.raw[pos]
    }

    /// Raw characters of the filled range
    pub fn raw_chars(&self) -> &[char] {
        &self.raw[..self.filled]
    }

    /// Script class at a filled position
    pub fn class(&self, pos: usize) -> ScriptClass {
        self.classes[pos]
    }

    /// Seed tag at a filled position
    pub fn seed(&self, pos: usize) -> SeedTag {
        self.seeds[pos]
    }

    /// Final tag at a filled position, if already emitted
    pub fn tag(&self, pos: usize) -> Option<SegTag> {
        self.tags[pos]
    }

    /// Final tags of the filled range
    pub fn tags(&self) -> &[Option<SegTag>] {
        &self.tags[..self.filled]
    }

    /// Write the final tag of a position
    pub fn set_tag(&mut self, pos: usize, tag: SegTag) {
        debug_assert!(self.tags[pos].is_none(), "tag written twice at {pos}");
        self.tags[pos] = Some(tag);
    }

    /// Folded codepoints of `start..end`, clipped to the filled range
    pub fn folded(&self, start: usize, end: usize) -> Vec<u32> {
        let end = end.min(self.filled);
        (start..end)
            .filter_map(|pos| self.code(pos).value())
            .collect()
    }

    /// Query every dictionary for the terms anchored at each filled position
    ///
    /// Candidates of one position are ordered by ascending length so the
    /// longest term is the last entry of its range.
    pub fn build_term_dag(&mut self, dict_mgr: &dyn DictionaryManager) -> usize {
        self.matches.clear();
        let codes = self.folded(0, self.filled);
        for pos in 0..self.filled {
            let start = self.matches.len();
            let found = dict_mgr.match_terms(&codes[pos..], &mut self.matches);
            self.matches[start..].sort_by_key(|m| (m.len, m.dict_id));
            self.match_counts[pos] = found as u32;
        }
        self.matches.len()
    }

    /// Turn per-position counts into prefix offsets
    pub fn build_term_index(&mut self) -> Result<()> {
        self.match_index[0] = 0;
        for pos in 0..self.filled {
            self.match_index[pos + 1] = self.match_index[pos] + self.match_counts[pos];
        }
        let total = self.match_index[self.filled] as usize;
        if total != self.matches.len() {
            return Err(SegmentError::CorruptMatchIndex {
                position: self.filled,
            });
        }
        Ok(())
    }

    /// Dictionary candidates anchored at `pos`; empty past the filled range
    pub fn candidates(&self, pos: usize) -> &[DictMatchEntry] {
        if pos >= self.filled {
            return &[];
        }
        let start = self.match_index[pos] as usize;
        let end = self.match_index[pos + 1] as usize;
        self.matches.get(start..end).unwrap_or(&[])
    }

    /// Number of candidates anchored at `pos`
    pub fn candidate_count(&self, pos: usize) -> usize {
        self.candidates(pos).len()
    }
}
