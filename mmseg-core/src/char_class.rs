//! Script classification of decoded characters

use crate::tag::SeedTag;

/// Opaque script-class tag produced by a [`CharMapper`]
///
/// The segmentor never interprets the value beyond comparing it with the
/// class resolved for a reference ideograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptClass(pub u16);

impl ScriptClass {
    /// Unclassified character
    pub const OTHER: ScriptClass = ScriptClass(0);
    /// CJK unified ideograph
    pub const CJK: ScriptClass = ScriptClass(1);
    /// Latin letter
    pub const LATIN: ScriptClass = ScriptClass(2);
    /// Decimal digit (ASCII or full-width)
    pub const DIGIT: ScriptClass = ScriptClass(3);
    /// Whitespace or control character
    pub const WHITESPACE: ScriptClass = ScriptClass(4);
    /// Punctuation, ASCII or CJK
    pub const PUNCTUATION: ScriptClass = ScriptClass(5);
    /// Hiragana or katakana
    pub const KANA: ScriptClass = ScriptClass(6);
    /// Hangul syllable or jamo
    pub const HANGUL: ScriptClass = ScriptClass(7);
}

/// Maps codepoints to script classes and seed tags
pub trait CharMapper: Send + Sync {
    /// Classify a codepoint
    fn transform(&self, code: u32) -> ScriptClass;

    /// Seed tag for a codepoint of the given class
    fn seed(&self, _code: u32, _class: ScriptClass) -> SeedTag {
        SeedTag::Undetermined
    }
}

/// Block-range classifier over the Unicode planes relevant to CJK text
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeCharMapper;

impl UnicodeCharMapper {
    /// Create a new mapper
    pub fn new() -> Self {
        Self
    }
}

impl CharMapper for UnicodeCharMapper {
    fn transform(&self, code: u32) -> ScriptClass {
        let Some(ch) = char::from_u32(code) else {
            return ScriptClass::OTHER;
        };
        match code {
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x3134F => {
                ScriptClass::CJK
            }
            0x3040..=0x30FF | 0x31F0..=0x31FF => ScriptClass::KANA,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => ScriptClass::HANGUL,
            0x3000..=0x303F | 0xFF01..=0xFF0F | 0xFF1A..=0xFF20 => ScriptClass::PUNCTUATION,
            0xFF10..=0xFF19 => ScriptClass::DIGIT,
            0xFF21..=0xFF3A | 0xFF41..=0xFF5A => ScriptClass::LATIN,
            _ if ch.is_whitespace() || ch.is_control() => ScriptClass::WHITESPACE,
            _ if ch.is_ascii_digit() => ScriptClass::DIGIT,
            _ if ch.is_alphabetic() && (ch.is_ascii() || code < 0x0250) => ScriptClass::LATIN,
            _ if ch.is_ascii_punctuation() => ScriptClass::PUNCTUATION,
            _ => ScriptClass::OTHER,
        }
    }

    fn seed(&self, _code: u32, class: ScriptClass) -> SeedTag {
        if class == ScriptClass::WHITESPACE {
            SeedTag::Single
        } else {
            SeedTag::Undetermined
        }
    }
}
