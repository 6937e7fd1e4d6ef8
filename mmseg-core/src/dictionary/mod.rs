//! Read-only dictionary interface consumed by the segmentor
//!
//! The segmentor only ever reads dictionaries. Storage, loading and pooling
//! live behind [`Dictionary`] and [`DictionaryManager`]; an in-memory
//! reference implementation is provided in [`memory`].

pub mod memory;

use crate::char_class::CharMapper;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

pub use memory::{MemoryDictionary, MemoryDictionaryManager};

/// Well-known name of the dictionary that supplies character frequencies
pub const BASE_DICTIONARY_NAME: &str = "mmseg.base";

/// Name of the frequency column in the base dictionary
pub const FREQ_COLUMN: &str = "freq";

/// Identifier of the base dictionary; any other id is a user dictionary
pub const BASE_DICTIONARY_ID: u16 = 0;

/// One candidate term anchored at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictMatchEntry {
    /// Term length in characters
    pub len: u16,
    /// Dictionary that produced the match
    pub dict_id: u16,
    /// Entry offset inside that dictionary
    pub value: u32,
}

impl DictMatchEntry {
    /// Whether the match comes from a user/override dictionary
    pub fn is_user(&self) -> bool {
        self.dict_id != BASE_DICTIONARY_ID
    }
}

/// Matches of one term across dictionaries
pub type DictMatchResult = SmallVec<[DictMatchEntry; 4]>;

/// Column datatype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Unsigned 32-bit integer (`4`)
    U32,
    /// Unsigned 16-bit integer (`2`)
    U16,
    /// Byte string (`s`)
    Str,
}

impl ColumnType {
    /// One-letter datatype code
    pub fn code(self) -> char {
        match self {
            ColumnType::U32 => '4',
            ColumnType::U16 => '2',
            ColumnType::Str => 's',
        }
    }

    /// Whether values of this type can be read as an integer
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::U32 | ColumnType::U16)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Position of the column inside an entry
    pub index: u16,
    /// Column name
    pub name: String,
    /// Column datatype
    pub datatype: ColumnType,
}

/// Ordered set of columns shared by every entry of a dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, returning the schema for chaining
    pub fn with_column(mut self, name: impl Into<String>, datatype: ColumnType) -> Self {
        let index = self.columns.len() as u16;
        self.columns.push(Column {
            index,
            name: name.into(),
            datatype,
        });
        self
    }

    /// Look a column up by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look a column up by index
    pub fn column_at(&self, index: u16) -> Option<&Column> {
        self.columns.get(index as usize)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over columns in order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }
}

/// Typed value stored in an entry field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// 32-bit integer
    U32(u32),
    /// 16-bit integer
    U16(u16),
    /// Byte string
    Str(Vec<u8>),
}

impl FieldValue {
    /// Datatype of the value
    pub fn datatype(&self) -> ColumnType {
        match self {
            FieldValue::U32(_) => ColumnType::U32,
            FieldValue::U16(_) => ColumnType::U16,
            FieldValue::Str(_) => ColumnType::Str,
        }
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::U32(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::U16(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.as_bytes().to_vec())
    }
}

/// Property record attached to a dictionary term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryData {
    fields: Vec<Option<FieldValue>>,
}

impl EntryData {
    /// Entry with `width` unset fields
    pub fn with_width(width: usize) -> Self {
        Self {
            fields: vec![None; width],
        }
    }

    /// Set a field by column index
    pub fn set(&mut self, index: u16, value: FieldValue) {
        let index = index as usize;
        if index >= self.fields.len() {
            self.fields.resize(index + 1, None);
        }
        self.fields[index] = Some(value);
    }

    /// Read an integer field; 16-bit values widen
    pub fn get_u32(&self, index: u16) -> Option<u32> {
        match self.fields.get(index as usize)? {
            Some(FieldValue::U32(v)) => Some(*v),
            Some(FieldValue::U16(v)) => Some(u32::from(*v)),
            _ => None,
        }
    }

    /// Read a string field
    pub fn get_data(&self, index: u16) -> Option<&[u8]> {
        match self.fields.get(index as usize)? {
            Some(FieldValue::Str(bytes)) => Some(bytes),
            _ => None,
        }
    }
}

/// Where a named column lives across the loaded dictionaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMarker {
    /// Dictionary holding the column
    pub dict_id: u16,
    /// Column index within that dictionary's schema
    pub column_index: u16,
    /// Column datatype
    pub datatype: ColumnType,
    /// Annotation property id assigned by the segmentation options
    pub prop_id: u16,
}

/// A single loaded dictionary
pub trait Dictionary: Send + Sync {
    /// Unique dictionary name
    fn name(&self) -> &str;

    /// Column layout of the entries
    fn schema(&self) -> &Schema;

    /// Offset of the entry whose term is exactly `codes`
    fn exact_match(&self, codes: &[u32]) -> Option<u32>;

    /// Entry record stored at `offset`
    fn entry_by_offset(&self, offset: u32) -> Option<&EntryData>;

    /// Report every term that is a prefix of `codes` as `(len, offset)`
    fn prefix_matches(&self, codes: &[u32], found: &mut dyn FnMut(usize, u32));

    /// Length of the longest term, in characters
    fn max_term_len(&self) -> usize;
}

/// The set of dictionaries visible to a segmentor
///
/// Dictionary ids are dense, starting at [`BASE_DICTIONARY_ID`].
pub trait DictionaryManager: Send + Sync {
    /// Dictionary by id
    fn dictionary(&self, id: u16) -> Option<&dyn Dictionary>;

    /// Number of loaded dictionaries
    fn dictionary_count(&self) -> usize;

    /// Character classifier applied while decoding input
    fn char_mapper(&self) -> &dyn CharMapper;

    /// Id of the dictionary with the given name
    fn dictionary_id(&self, name: &str) -> Option<u16> {
        (0..self.dictionary_count() as u16)
            .find(|&id| self.dictionary(id).is_some_and(|d| d.name() == name))
    }

    /// Dictionary by name
    fn dictionary_by_name(&self, name: &str) -> Option<&dyn Dictionary> {
        self.dictionary_id(name).and_then(|id| self.dictionary(id))
    }

    /// Every dictionary column named `column`; `prop_id` is left at zero
    fn field_markers(&self, column: &str) -> Vec<FieldMarker> {
        (0..self.dictionary_count() as u16)
            .filter_map(|id| {
                let col = self.dictionary(id)?.schema().column(column)?;
                Some(FieldMarker {
                    dict_id: id,
                    column_index: col.index,
                    datatype: col.datatype,
                    prop_id: 0,
                })
            })
            .collect()
    }

    /// Append every candidate term anchored at `codes[0]`; returns the count
    fn match_terms(&self, codes: &[u32], out: &mut Vec<DictMatchEntry>) -> usize {
        let before = out.len();
        for id in 0..self.dictionary_count() as u16 {
            if let Some(dict) = self.dictionary(id) {
                dict.prefix_matches(codes, &mut |len, value| {
                    out.push(DictMatchEntry {
                        len: len as u16,
                        dict_id: id,
                        value,
                    })
                });
            }
        }
        out.len() - before
    }

    /// Every dictionary entry for exactly the term `term`
    fn match_by_dictionary(&self, term: &[u32]) -> DictMatchResult {
        let mut result = DictMatchResult::new();
        for id in 0..self.dictionary_count() as u16 {
            if let Some(value) = self.dictionary(id).and_then(|d| d.exact_match(term)) {
                result.push(DictMatchEntry {
                    len: term.len() as u16,
                    dict_id: id,
                    value,
                });
            }
        }
        result
    }

    /// Longest term across all dictionaries
    fn max_term_len(&self) -> usize {
        (0..self.dictionary_count() as u16)
            .filter_map(|id| self.dictionary(id))
            .map(|d| d.max_term_len())
            .max()
            .unwrap_or(0)
    }
}
