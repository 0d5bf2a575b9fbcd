//! # fusion-dict
//!
//! Builds and reads compact binary word dictionaries.
//!
//! A dictionary is a radix trie of words with 8-bit frequencies and
//! weighted links to other words (bigrams). The binary form packs every
//! node with variable-width offsets; see [`makedict::format`] for the layout.
pub mod makedict;

// Re-export the main types for convenience
pub use makedict::{
    build_dictionary, from_bytes, read_dictionary, to_bytes, write_dictionary,
    FusionDictionary, MakedictError, Result,
    types::models::{DictionaryHeader, WeightedString, Word},
};
