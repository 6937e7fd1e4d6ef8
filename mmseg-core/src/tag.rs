//! Per-character segmentation tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boundary tag written once per character by the disambiguator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegTag {
    /// First character of a multi-character token
    Begin,
    /// Interior character of a multi-character token
    Middle,
    /// Last character of a multi-character token
    End,
    /// Single-character token
    Single,
}

impl SegTag {
    /// Conventional one-letter form (`B`, `M`, `E`, `S`)
    pub fn as_char(self) -> char {
        match self {
            SegTag::Begin => 'B',
            SegTag::Middle => 'M',
            SegTag::End => 'E',
            SegTag::Single => 'S',
        }
    }

    /// Parse the one-letter form
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(SegTag::Begin),
            'M' => Some(SegTag::Middle),
            'E' => Some(SegTag::End),
            'S' => Some(SegTag::Single),
            _ => None,
        }
    }

    /// Whether a token boundary follows this character
    pub fn closes_token(self) -> bool {
        matches!(self, SegTag::End | SegTag::Single)
    }
}

impl fmt::Display for SegTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Pre-classification assigned while characters are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedTag {
    /// No opinion; the dictionary decides
    #[default]
    Undetermined,
    /// Always emitted as a single-character token
    Single,
}

/// Render a tag slice as a `BMES` string
pub fn tags_to_string(tags: &[SegTag]) -> String {
    tags.iter().map(|t| t.as_char()).collect()
}
