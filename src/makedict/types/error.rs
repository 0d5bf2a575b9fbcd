//! Custom error types for the fusion-dict crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum MakedictError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The first two bytes of the file are not the dictionary magic number.
    #[error("Bad magic number: expected {expected:#06x}, found {found:#06x}")]
    BadMagic { expected: u16, found: u16 },

    /// The file declares a format version newer than this implementation reads.
    #[error("Unsupported format version {found}: only versions up to {supported} are supported")]
    UnsupportedVersion { found: u8, supported: u8 },

    /// The node stream is structurally invalid or truncated.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A word was added twice with a real (non-zero) frequency.
    #[error("Word already exists in the dictionary: {0:?}")]
    DuplicateWord(String),

    /// A terminal frequency outside of [0, 255].
    #[error("Frequency {frequency} for word {word:?} is out of range [0, 255]")]
    FrequencyOutOfRange { word: String, frequency: u32 },

    /// An associated-word frequency that does not fit the 4-bit attribute field.
    #[error("Bigram frequency {frequency} for word {word:?} is out of range [0, 15]")]
    BigramFrequencyOutOfRange { word: String, frequency: u8 },

    /// Words must contain at least one character.
    #[error("Cannot add an empty word")]
    EmptyWord,

    /// A node holds more groups than the one-byte group count allows.
    #[error("A node has a group count over 127 ({count})")]
    TooManyGroups { count: usize },

    /// The serialized node stream does not fit the 24-bit address space.
    #[error("Dictionary of {size} bytes exceeds the 16 MiB address space")]
    DictionaryTooLarge { size: usize },

    /// An internal consistency check of the layout failed.
    #[error("Layout invariant violated: {0}")]
    LayoutInvariant(String),

    /// The markup input could not be parsed.
    #[error("Malformed XML: {0}")]
    MalformedXml(String),
}

impl MakedictError {
    /// Returns true for checked failures caused by the input file itself
    /// (as opposed to builder defects or I/O).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MakedictError::BadMagic { .. }
                | MakedictError::UnsupportedVersion { .. }
                | MakedictError::InvalidFormat(_)
        )
    }
}

/// A convenience `Result` type alias using the crate's `MakedictError` type.
pub type Result<T> = std::result::Result<T, MakedictError>;
