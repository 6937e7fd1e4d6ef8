//! Chunk-based disambiguation with the four MMSeg rules
//!
//! At every scan position the policy enumerates all three-term chunks
//! reachable through the match index and keeps the best one under a strict
//! lexicographic order:
//!
//! 1. largest total length
//! 2. smallest variance of the three term lengths
//! 3. variances closer than [`VARIANCE_EPSILON`] count as equal
//! 4. largest freedom, the summed log-frequency of single-character terms
//!
//! Only the first term of the winning chunk is emitted; the scan then
//! resumes right after it.

use crate::block::Block;
use crate::dictionary::{DictMatchEntry, DictionaryManager, FieldMarker};
use crate::error::{ConfigError, ConfigResult, Result, SegmentError};
use crate::freq::FrequencyTable;
use crate::status::SegmentStatus;
use crate::tag::{SegTag, SeedTag};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Variances closer than this are treated as equal
pub const VARIANCE_EPSILON: f32 = 1e-6;

/// Three consecutive terms starting at `start`
///
/// Each `termN_pos` is the exclusive end of the N-th term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk {
    /// Scan position the chunk starts at
    pub start: usize,
    /// End of the first term
    pub term1_pos: usize,
    /// End of the second term
    pub term2_pos: usize,
    /// End of the third term
    pub term3_pos: usize,
    /// Dictionary match behind the first term, `None` for the one-character fallback
    pub match_entry: Option<DictMatchEntry>,
}

impl Chunk {
    /// Lengths of the three terms
    pub fn lengths(&self) -> [usize; 3] {
        [
            self.term1_pos - self.start,
            self.term2_pos - self.term1_pos,
            self.term3_pos - self.term2_pos,
        ]
    }

    /// Total length covered by the chunk
    pub fn total_len(&self) -> usize {
        self.term3_pos - self.start
    }

    /// Sum of squared deviations of the term lengths from their mean
    pub fn variance(&self) -> f32 {
        let mean = self.total_len() as f32 / 3.0;
        self.lengths()
            .iter()
            .map(|&len| {
                let diff = len as f32 - mean;
                diff * diff
            })
            .sum()
    }

    /// Summed log-frequency of the single-character terms
    pub fn freedom(&self, block: &Block, freq: &FrequencyTable) -> f32 {
        [self.start, self.term1_pos, self.term2_pos]
            .iter()
            .zip(self.lengths())
            .filter(|&(_, len)| len == 1)
            .filter_map(|(&pos, _)| block.code(pos).value())
            .map(|code| freq.freq_log(code))
            .sum()
    }
}

/// Terms anchored at `pos`, longest first, ending with the one-character fallback
fn terms_at(block: &Block, pos: usize) -> impl Iterator<Item = (usize, Option<DictMatchEntry>)> + '_ {
    block
        .candidates(pos)
        .iter()
        .rev()
        .map(move |m| (pos + m.len as usize, Some(*m)))
        .chain(std::iter::once((pos + 1, None)))
}

/// Lazily enumerate every chunk starting at `start`
///
/// The first and second terms must end before `horizon`; the third term is
/// unrestricted. Positions past the filled range have no candidates, so only
/// the one-character fallback reaches into them.
pub fn chunks(block: &Block, start: usize, horizon: usize) -> impl Iterator<Item = Chunk> + '_ {
    terms_at(block, start)
        .filter(move |&(term1_pos, _)| term1_pos < horizon)
        .flat_map(move |(term1_pos, match_entry)| {
            terms_at(block, term1_pos)
                .filter(move |&(term2_pos, _)| term2_pos < horizon)
                .flat_map(move |(term2_pos, _)| {
                    terms_at(block, term2_pos).map(move |(term3_pos, _)| Chunk {
                        start,
                        term1_pos,
                        term2_pos,
                        term3_pos,
                        match_entry,
                    })
                })
        })
}

/// Pick the best chunk under the four rules
///
/// `freedom` is only evaluated for chunks that tie on length and variance.
/// On a full tie the earlier chunk is kept.
pub fn select_best_chunk<I, F>(chunks: I, mut freedom: F) -> Option<Chunk>
where
    I: IntoIterator<Item = Chunk>,
    F: FnMut(&Chunk) -> f32,
{
    let mut best: Option<Chunk> = None;
    let mut best_freedom: Option<f32> = None;

    for chunk in chunks {
        let Some(current) = best else {
            best = Some(chunk);
            continue;
        };

        let replace = match chunk.total_len().cmp(&current.total_len()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                let (var, best_var) = (chunk.variance(), current.variance());
                if (var - best_var).abs() >= VARIANCE_EPSILON {
                    var < best_var
                } else {
                    let best_score = *best_freedom.get_or_insert_with(|| freedom(&current));
                    let score = freedom(&chunk);
                    if score > best_score {
                        best_freedom = Some(score);
                        best = Some(chunk);
                    }
                    continue;
                }
            }
        };

        if replace {
            best = Some(chunk);
            best_freedom = None;
        }
    }
    best
}

/// MMSeg disambiguation policy
///
/// Holds the shared frequency table and the annotation bindings resolved by
/// [`bind_annote`](Self::bind_annote).
#[derive(Debug, Clone)]
pub struct MmsegPolicy {
    freq: Arc<FrequencyTable>,
    bindings: HashMap<u16, Vec<FieldMarker>>,
}

impl MmsegPolicy {
    /// Policy without annotation bindings
    pub fn new(freq: Arc<FrequencyTable>) -> Self {
        Self {
            freq,
            bindings: HashMap::new(),
        }
    }

    /// Frequency table used by the freedom rule
    pub fn frequency_table(&self) -> &Arc<FrequencyTable> {
        &self.freq
    }

    /// Field markers bound to a dictionary
    pub fn bindings(&self, dict_id: u16) -> &[FieldMarker] {
        self.bindings.get(&dict_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve the annotation columns named in the status options
    ///
    /// Replaces any previous bindings. Columns no dictionary carries are
    /// ignored.
    ///
    /// # Errors
    ///
    /// A bound column that is not a string column, or a marker whose
    /// dictionary id is out of range.
    pub fn bind_annote(
        &mut self,
        dict_mgr: &dyn DictionaryManager,
        status: &SegmentStatus,
    ) -> ConfigResult<()> {
        let options = status.options();
        let count = dict_mgr.dictionary_count();
        let mut bindings: HashMap<u16, Vec<FieldMarker>> = HashMap::new();

        for column in options.column_names() {
            for mut marker in dict_mgr.field_markers(column) {
                if usize::from(marker.dict_id) >= count {
                    return Err(ConfigError::DictionaryOutOfRange {
                        dict_id: marker.dict_id,
                        count,
                    });
                }
                if marker.datatype.is_numeric() {
                    return Err(ConfigError::ColumnType {
                        column: column.to_string(),
                        found: marker.datatype.code(),
                        expected: "a string column",
                    });
                }
                marker.prop_id = options.annotation_id(column);
                bindings.entry(marker.dict_id).or_default().push(marker);
            }
        }

        debug!(
            "Bound annotation columns `{}` across {} dictionaries",
            options.columns,
            bindings.len()
        );
        self.bindings = bindings;
        Ok(())
    }

    /// Tag every position of the active block below the scan limit
    ///
    /// Returns the number of positions tagged.
    pub fn apply(
        &self,
        dict_mgr: &dyn DictionaryManager,
        status: &mut SegmentStatus,
    ) -> Result<usize> {
        let limit = status.scan_limit();
        let horizon = status.horizon();
        status.begin_scan();

        let start = status.scan_position();
        let mut i = start;
        while i < limit {
            let (end, match_entry) = self.decide(status.active_block(), i, horizon);
            emit(status.active_block_mut(), i, end);
            if match_entry.is_some() && !self.bindings.is_empty() {
                self.annotate(dict_mgr, status, i, end)?;
            }
            status.advance_to(end);
            i = end;
        }
        Ok(i - start)
    }

    /// End of the token starting at `i` and the match that produced it
    fn decide(&self, block: &Block, i: usize, horizon: usize) -> (usize, Option<DictMatchEntry>) {
        if block.seed(i) == SeedTag::Single {
            return (i + 1, None);
        }
        let candidates = block.candidates(i);
        if candidates.is_empty() {
            return (i + 1, None);
        }
        if let Some(user) = candidates.iter().rev().find(|m| m.is_user()) {
            return (i + user.len as usize, Some(*user));
        }

        let freq = self.freq.as_ref();
        select_best_chunk(chunks(block, i, horizon), |chunk| {
            chunk.freedom(block, freq)
        })
        .map_or((i + 1, None), |chunk| (chunk.term1_pos, chunk.match_entry))
    }

    /// Record bound string columns of every dictionary holding `start..end`
    fn annotate(
        &self,
        dict_mgr: &dyn DictionaryManager,
        status: &mut SegmentStatus,
        start: usize,
        end: usize,
    ) -> Result<()> {
        let term = status.active_block().folded(start, end);
        let len = (end - start) as u16;

        for found in dict_mgr.match_by_dictionary(&term) {
            let markers = self.bindings(found.dict_id);
            if markers.is_empty() {
                continue;
            }
            let dict = dict_mgr.dictionary(found.dict_id).ok_or(
                ConfigError::DictionaryOutOfRange {
                    dict_id: found.dict_id,
                    count: dict_mgr.dictionary_count(),
                },
            )?;
            let record =
                dict.entry_by_offset(found.value)
                    .ok_or(SegmentError::MissingEntry {
                        dict_id: found.dict_id,
                        offset: found.value,
                    })?;
            for marker in markers {
                if let Some(data) = record.get_data(marker.column_index) {
                    status.annotate_by_prop_id(
                        start,
                        len,
                        marker.dict_id,
                        marker.prop_id,
                        data,
                        false,
                    );
                }
            }
        }
        Ok(())
    }
}

/// Write `S` for a one-character token, `B M* E` otherwise
fn emit(block: &mut Block, start: usize, end: usize) {
    if end == start + 1 {
        block.set_tag(start, SegTag::Single);
        return;
    }
    block.set_tag(start, SegTag::Begin);
    for pos in start + 1..end - 1 {
        block.set_tag(pos, SegTag::Middle);
    }
    block.set_tag(end - 1, SegTag::End);
}
