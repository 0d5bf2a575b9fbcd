//! Core dictionary building and reading module.
//!
//! Words go into a [`FusionDictionary`], a radix trie whose edges carry
//! runs of characters. The trie is then flattened, its offsets compacted
//! to their smallest width, and written out; the reader rebuilds the trie
//! from those bytes.

pub mod codec;
pub mod dictionary;
pub mod format;
pub mod iter;
pub mod layout;
pub mod reader;
pub mod types;
pub mod writer;
pub mod xml;

#[cfg(test)]
mod proptests;

pub use dictionary::{CharGroup, FusionDictionary, GroupRef, Node, NodeId};
pub use format::header::is_binary_dictionary;
pub use iter::WordIterator;
pub use reader::{from_bytes, read_dictionary, read_dictionary_file, read_header};
pub use types::error::{MakedictError, Result};
pub use types::models::{DictionaryHeader, DictionaryOptions, FormatVersion, WeightedString, Word};
pub use writer::{to_bytes, write_dictionary};

/// Builds a dictionary from `(word, frequency, associated words)` entries
/// and returns its binary form.
///
/// # Example
/// ```
/// use fusion_dict::makedict::{build_dictionary, from_bytes, WeightedString};
///
/// let bytes = build_dictionary(vec![
///     ("an", 200, vec![]),
///     ("and", 180, vec![WeightedString::new("an", 12)]),
/// ])
/// .unwrap();
/// let dict = from_bytes(&bytes).unwrap();
/// assert_eq!(dict.frequency("and"), Some(180));
/// ```
pub fn build_dictionary<I, S>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (S, u32, Vec<WeightedString>)>,
    S: AsRef<str>,
{
    let mut dict = FusionDictionary::new();
    for (word, frequency, bigrams) in entries {
        dict.add(word.as_ref(), frequency, bigrams)?;
    }
    to_bytes(&mut dict)
}
