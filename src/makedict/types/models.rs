//! Core data structures shared by the dictionary model and the binary format.
//!
//! This module defines:
//! - Weighted word references (associated words / bigrams)
//! - Words as produced by dictionary enumeration
//! - Header metadata of a binary dictionary

use std::fmt;

use super::error::{MakedictError, Result};

/// A word with a frequency.
///
/// Used for associated-word (bigram) references. The frequency is the
/// already-scaled 4-bit value stored in the binary attribute flags, so it
/// lies in [0, 15].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeightedString {
    pub word: String,
    pub frequency: u8,
}

impl WeightedString {
    pub fn new(word: impl Into<String>, frequency: u8) -> Self {
        Self {
            word: word.into(),
            frequency,
        }
    }
}

/// A terminal entry of the dictionary, as yielded by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub word: String,
    pub frequency: u8,
    pub bigrams: Vec<WeightedString>,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.word, self.frequency)?;
        if !self.bigrams.is_empty() {
            let targets: Vec<String> = self
                .bigrams
                .iter()
                .map(|b| format!("{}:{}", b.word, b.frequency))
                .collect();
            write!(f, " -> [{}]", targets.join(", "))?;
        }
        Ok(())
    }
}

/// Binary format versions understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatVersion {
    /// Early files; the node stream is laid out as in version 1.
    V0,
    V1,
}

impl FormatVersion {
    /// The newest version this implementation can read and the one it writes.
    pub const CURRENT: FormatVersion = FormatVersion::V1;

    pub fn as_u8(self) -> u8 {
        match self {
            FormatVersion::V0 => 0,
            FormatVersion::V1 => 1,
        }
    }
}

impl TryFrom<u8> for FormatVersion {
    type Error = MakedictError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            v => Err(MakedictError::UnsupportedVersion {
                found: v,
                supported: Self::CURRENT.as_u8(),
            }),
        }
    }
}

/// Options global to the dictionary.
///
/// Stored in the reserved 16-bit header field. No option bit is defined
/// yet, so the only valid value is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictionaryOptions {
    bits: u16,
}

impl DictionaryOptions {
    pub fn bits(&self) -> u16 {
        self.bits
    }
}

impl TryFrom<u16> for DictionaryOptions {
    type Error = MakedictError;
    fn try_from(bits: u16) -> Result<Self> {
        if bits != 0 {
            return Err(MakedictError::InvalidFormat(format!(
                "Unknown dictionary option bits: {:#06x}",
                bits
            )));
        }
        Ok(Self { bits })
    }
}

/// Parsed binary dictionary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryHeader {
    pub version: FormatVersion,
    pub options: DictionaryOptions,
}

impl Default for DictionaryHeader {
    fn default() -> Self {
        Self {
            version: FormatVersion::CURRENT,
            options: DictionaryOptions::default(),
        }
    }
}
