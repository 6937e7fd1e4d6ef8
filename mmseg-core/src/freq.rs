//! Per-character log-frequency table used by the freedom rule

use crate::char_class::ScriptClass;
use crate::dictionary::{
    DictionaryManager, BASE_DICTIONARY_ID, BASE_DICTIONARY_NAME, FREQ_COLUMN,
};
use crate::error::{ConfigError, ConfigResult};
use log::debug;

/// Number of codepoints covered by the table (the Basic Multilingual Plane)
pub const TABLE_SIZE: usize = 0x10000;

/// Scale applied to `ln(freq + 1)`
pub const FREQ_SCALE: f32 = 64.0;

/// Immutable `ln(freq + 1) * 64` per BMP codepoint
///
/// Built once from the base dictionary and shared read-only between
/// segmentors through an `Arc`.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    freq_log: Vec<f32>,
    cjk_class: ScriptClass,
}

impl FrequencyTable {
    /// Read the `freq` column of every single-character term of the base dictionary
    ///
    /// # Errors
    ///
    /// Fails when the base dictionary is not loaded as id
    /// [`BASE_DICTIONARY_ID`], has no `freq` column, or that column is not
    /// numeric. Candidates from any other id take user-dictionary priority.
    pub fn build(dict_mgr: &dyn DictionaryManager) -> ConfigResult<Self> {
        let missing = || ConfigError::MissingBaseDictionary {
            name: BASE_DICTIONARY_NAME.to_string(),
        };
        let base_id = dict_mgr
            .dictionary_id(BASE_DICTIONARY_NAME)
            .ok_or_else(missing)?;
        if base_id != BASE_DICTIONARY_ID {
            return Err(ConfigError::BaseDictionaryId {
                name: BASE_DICTIONARY_NAME.to_string(),
                found: base_id,
                expected: BASE_DICTIONARY_ID,
            });
        }
        let base = dict_mgr.dictionary(base_id).ok_or_else(missing)?;
        let column = base
            .schema()
            .column(FREQ_COLUMN)
            .ok_or_else(|| ConfigError::MissingColumn {
                dictionary: BASE_DICTIONARY_NAME.to_string(),
                column: FREQ_COLUMN.to_string(),
            })?;
        if !column.datatype.is_numeric() {
            return Err(ConfigError::ColumnType {
                column: FREQ_COLUMN.to_string(),
                found: column.datatype.code(),
                expected: "a numeric column",
            });
        }
        let column_index = column.index;

        let mut freq_log = vec![0.0f32; TABLE_SIZE];
        let mut known = 0usize;
        for code in 0..TABLE_SIZE as u32 {
            let Some(freq) = base
                .exact_match(&[code])
                .and_then(|offset| base.entry_by_offset(offset))
                .and_then(|entry| entry.get_u32(column_index))
            else {
                continue;
            };
            freq_log[code as usize] = ((f64::from(freq) + 1.0).ln() as f32) * FREQ_SCALE;
            known += 1;
        }

        let cjk_class = dict_mgr.char_mapper().transform(u32::from('中'));
        debug!(
            "Built frequency table: {} characters with frequency, CJK class {:?}",
            known, cjk_class
        );
        Ok(Self {
            freq_log,
            cjk_class,
        })
    }

    /// Log-frequency of a codepoint; 0 outside the table or for unknown characters
    pub fn freq_log(&self, code: u32) -> f32 {
        self.freq_log.get(code as usize).copied().unwrap_or(0.0)
    }

    /// Script class the character mapper assigns to CJK ideographs
    pub fn cjk_class(&self) -> ScriptClass {
        self.cjk_class
    }
}
