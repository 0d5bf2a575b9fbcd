//! Enumeration of the words stored in a [`FusionDictionary`].
//!
//! Words come out depth-first, groups in node order, a terminal group before
//! the words below it; since groups are sorted by first character this is
//! ascending code point order.
//!
//! # Example
//! ```
//! # use fusion_dict::FusionDictionary;
//! let mut dict = FusionDictionary::new();
//! dict.add("bee", 10, vec![]).unwrap();
//! dict.add("be", 20, vec![]).unwrap();
//! let words: Vec<String> = dict.iter().map(|w| w.word).collect();
//! assert_eq!(words, vec!["be", "bee"]);
//! ```

use super::dictionary::{FusionDictionary, NodeId};
use super::types::models::Word;

struct Position {
    node: NodeId,
    next: usize,
    /// Length of the current prefix when this node was entered.
    prefix_len: usize,
}

/// Iterator over every terminal word, placeholders included.
///
/// Created by [`FusionDictionary::iter()`].
pub struct WordIterator<'a> {
    dict: &'a FusionDictionary,
    stack: Vec<Position>,
    current: Vec<char>,
}

impl<'a> WordIterator<'a> {
    pub(super) fn new(dict: &'a FusionDictionary) -> Self {
        Self {
            dict,
            stack: vec![Position {
                node: dict.root(),
                next: 0,
                prefix_len: 0,
            }],
            current: Vec::new(),
        }
    }
}

impl<'a> Iterator for WordIterator<'a> {
    type Item = Word;

    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        loop {
            let top = self.stack.last_mut()?;
            let groups = dict.node(top.node).groups();
            if top.next >= groups.len() {
                self.stack.pop();
                continue;
            }

            let group = &groups[top.next];
            top.next += 1;
            self.current.truncate(top.prefix_len);
            self.current.extend_from_slice(group.chars());

            if let Some(child) = group.children() {
                self.stack.push(Position {
                    node: child,
                    next: 0,
                    prefix_len: self.current.len(),
                });
            }
            if let Some(frequency) = group.frequency() {
                return Some(Word {
                    word: self.current.iter().collect(),
                    frequency,
                    bigrams: group.bigrams().to_vec(),
                });
            }
        }
    }
}
