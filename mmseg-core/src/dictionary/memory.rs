//! In-memory dictionaries backed by a double-array trie

use super::{
    ColumnType, Dictionary, DictionaryManager, EntryData, FieldValue, Schema,
};
use crate::block::fold_char;
use crate::char_class::{CharMapper, UnicodeCharMapper};
use crate::error::{ConfigError, ConfigResult};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Dictionary held entirely in memory
///
/// Terms are stored case-folded, matching the folding applied to input when
/// lowercasing is enabled. Lookups go through a [`crawdad::Trie`] that is
/// built on the first lookup after the last insert.
pub struct MemoryDictionary {
    name: String,
    schema: Schema,
    terms: BTreeMap<String, u32>,
    entries: Vec<EntryData>,
    max_len: usize,
    trie: OnceLock<Result<Option<crawdad::Trie>, String>>,
}

impl fmt::Debug for MemoryDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDictionary")
            .field("name", &self.name)
            .field("terms", &self.terms.len())
            .field("max_len", &self.max_len)
            .field("indexed", &self.trie.get().is_some())
            .finish()
    }
}

impl Clone for MemoryDictionary {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            terms: self.terms.clone(),
            entries: self.entries.clone(),
            max_len: self.max_len,
            trie: OnceLock::new(),
        }
    }
}

impl MemoryDictionary {
    /// Create an empty dictionary
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            terms: BTreeMap::new(),
            entries: Vec::new(),
            max_len: 0,
            trie: OnceLock::new(),
        }
    }

    /// Build the trie now instead of on the first lookup
    ///
    /// Fails when the terms cannot be packed into a double-array trie.
    pub fn freeze(&self) -> ConfigResult<()> {
        match self.index() {
            Ok(_) => Ok(()),
            Err(e) => Err(ConfigError::InvalidOptions(format!(
                "cannot index dictionary `{}`: {e}",
                self.name
            ))),
        }
    }

    fn index(&self) -> &Result<Option<crawdad::Trie>, String> {
        self.trie.get_or_init(|| {
            if self.terms.is_empty() {
                return Ok(None);
            }
            let records = self.terms.iter().map(|(term, &offset)| (term, offset));
            let trie = crawdad::Trie::from_records(records).map_err(|e| e.to_string())?;
            debug!(
                "Indexed dictionary `{}`: {} terms",
                self.name,
                self.terms.len()
            );
            Ok(Some(trie))
        })
    }

    fn trie(&self) -> Option<&crawdad::Trie> {
        self.index().as_ref().ok()?.as_ref()
    }

    /// Insert a term with named field values, returning its entry offset
    ///
    /// Fails when the term already exists, a column is unknown, or a value
    /// does not match the column's datatype.
    pub fn insert<'a, I>(&mut self, term: &str, fields: I) -> ConfigResult<u32>
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let folded: String = term.chars().map(fold_char).collect();
        if folded.is_empty() {
            return Err(ConfigError::InvalidOptions("empty dictionary term".into()));
        }
        if folded.contains('\0') {
            return Err(ConfigError::InvalidOptions(format!(
                "term `{}` contains a NUL character",
                term.escape_debug()
            )));
        }
        if self.terms.contains_key(&folded) {
            return Err(ConfigError::InvalidOptions(format!(
                "term `{term}` already exists in `{}`",
                self.name
            )));
        }

        let mut entry = EntryData::with_width(self.schema.len());
        for (column, value) in fields {
            let col = self
                .schema
                .column(column)
                .ok_or_else(|| ConfigError::MissingColumn {
                    dictionary: self.name.clone(),
                    column: column.to_string(),
                })?;
            if col.datatype != value.datatype() {
                return Err(ConfigError::ColumnType {
                    column: column.to_string(),
                    found: value.datatype().code(),
                    expected: describe(col.datatype),
                });
            }
            entry.set(col.index, value);
        }

        let offset = self.entries.len() as u32;
        self.entries.push(entry);
        self.max_len = self.max_len.max(folded.chars().count());
        self.terms.insert(folded, offset);
        self.trie = OnceLock::new();
        Ok(offset)
    }

    /// Insert a term that carries no properties
    pub fn insert_term(&mut self, term: &str) -> ConfigResult<u32> {
        self.insert(term, std::iter::empty())
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no terms
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn describe(datatype: ColumnType) -> &'static str {
    match datatype {
        ColumnType::U32 => "a 32-bit integer",
        ColumnType::U16 => "a 16-bit integer",
        ColumnType::Str => "a string",
    }
}

impl Dictionary for MemoryDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn exact_match(&self, codes: &[u32]) -> Option<u32> {
        let chars: Option<Vec<char>> = codes.iter().map(|&c| char::from_u32(c)).collect();
        self.trie()?.exact_match(chars?)
    }

    fn entry_by_offset(&self, offset: u32) -> Option<&EntryData> {
        self.entries.get(offset as usize)
    }

    fn prefix_matches(&self, codes: &[u32], found: &mut dyn FnMut(usize, u32)) {
        let Some(trie) = self.trie() else {
            return;
        };
        let haystack = codes.iter().map_while(|&c| char::from_u32(c));
        for (offset, end) in trie.common_prefix_search(haystack) {
            found(end, offset);
        }
    }

    fn max_term_len(&self) -> usize {
        self.max_len
    }
}

/// Ordered collection of in-memory dictionaries
///
/// The first dictionary added receives id 0 and is treated as the base
/// dictionary; later ones are user dictionaries that take priority during
/// segmentation.
pub struct MemoryDictionaryManager {
    dictionaries: Vec<MemoryDictionary>,
    mapper: Box<dyn CharMapper>,
}

impl std::fmt::Debug for MemoryDictionaryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDictionaryManager")
            .field(
                "dictionaries",
                &self.dictionaries.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for MemoryDictionaryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDictionaryManager {
    /// Empty manager using [`UnicodeCharMapper`]
    pub fn new() -> Self {
        Self::with_char_mapper(Box::new(UnicodeCharMapper::new()))
    }

    /// Empty manager with a custom character mapper
    pub fn with_char_mapper(mapper: Box<dyn CharMapper>) -> Self {
        Self {
            dictionaries: Vec::new(),
            mapper,
        }
    }

    /// Register a dictionary, returning its id; its trie is built here
    pub fn add(&mut self, dictionary: MemoryDictionary) -> ConfigResult<u16> {
        if self
            .dictionaries
            .iter()
            .any(|d| d.name() == dictionary.name())
        {
            return Err(ConfigError::InvalidOptions(format!(
                "dictionary `{}` registered twice",
                dictionary.name()
            )));
        }
        let id = u16::try_from(self.dictionaries.len()).map_err(|_| {
            ConfigError::DictionaryOutOfRange {
                dict_id: u16::MAX,
                count: self.dictionaries.len(),
            }
        })?;
        dictionary.freeze()?;
        self.dictionaries.push(dictionary);
        Ok(id)
    }
}

impl DictionaryManager for MemoryDictionaryManager {
    fn dictionary(&self, id: u16) -> Option<&dyn Dictionary> {
        self.dictionaries
            .get(id as usize)
            .map(|d| d as &dyn Dictionary)
    }

    fn dictionary_count(&self) -> usize {
        self.dictionaries.len()
    }

    fn char_mapper(&self) -> &dyn CharMapper {
        self.mapper.as_ref()
    }
}
