//! In-memory radix trie: nodes of character groups, stored in an arena.
//!
//! A [`CharGroup`] is an edge of the trie covering one or more characters.
//! Whether it ends a word is carried by its frequency: `None` means "not a
//! terminal", `Some(f)` means the path up to here is a word of frequency `f`.
//! Groups inside a [`Node`] are kept sorted by their first character, and no
//! two groups of a node share a first character.
//!
//! Nodes live in a flat vector owned by the [`FusionDictionary`]; children
//! are referred to by [`NodeId`] and associated words by their text, so the
//! structure has no live back-pointers.

use std::mem;

use super::format::{MAX_BIGRAM_FREQUENCY, MAX_TERMINAL_FREQUENCY};
use super::iter::WordIterator;
use super::types::error::{MakedictError, Result};
use super::types::models::{DictionaryOptions, WeightedString, Word};

/// Index of a node inside its dictionary's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of a group: the node holding it and its index in that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupRef {
    pub node: NodeId,
    pub index: usize,
}

/// One edge of the trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharGroup {
    pub(crate) chars: Vec<char>,
    pub(crate) frequency: Option<u8>,
    pub(crate) bigrams: Vec<WeightedString>,
    pub(crate) children: Option<NodeId>,
    // Filled in by the compaction engine.
    pub(crate) cached_size: Option<usize>,
    pub(crate) cached_address: Option<usize>,
    // Children offset width, then one width per associated word.
    pub(crate) offset_widths: Vec<usize>,
}

impl CharGroup {
    pub(crate) fn new(
        chars: Vec<char>,
        frequency: Option<u8>,
        bigrams: Vec<WeightedString>,
        children: Option<NodeId>,
    ) -> Self {
        debug_assert!(!chars.is_empty(), "a group covers at least one character");
        Self {
            chars,
            frequency,
            bigrams,
            children,
            cached_size: None,
            cached_address: None,
            offset_widths: Vec::new(),
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn first_char(&self) -> char {
        self.chars[0]
    }

    pub fn frequency(&self) -> Option<u8> {
        self.frequency
    }

    pub fn is_terminal(&self) -> bool {
        self.frequency.is_some()
    }

    pub fn has_several_chars(&self) -> bool {
        self.chars.len() > 1
    }

    pub fn bigrams(&self) -> &[WeightedString] {
        &self.bigrams
    }

    pub fn children(&self) -> Option<NodeId> {
        self.children
    }

    /// Byte size computed by the last compaction, if any.
    pub fn cached_size(&self) -> Option<usize> {
        self.cached_size
    }

    /// Address (relative to the node stream) assigned by the last compaction.
    pub fn cached_address(&self) -> Option<usize> {
        self.cached_address
    }
}

/// An ordered set of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub(crate) groups: Vec<CharGroup>,
    pub(crate) cached_size: Option<usize>,
    pub(crate) cached_address: Option<usize>,
}

impl Node {
    pub(crate) fn with_groups(groups: Vec<CharGroup>) -> Self {
        Self {
            groups,
            cached_size: None,
            cached_address: None,
        }
    }

    pub fn groups(&self) -> &[CharGroup] {
        &self.groups
    }

    pub fn cached_size(&self) -> Option<usize> {
        self.cached_size
    }

    pub fn cached_address(&self) -> Option<usize> {
        self.cached_address
    }

    /// Binary search on first characters.
    ///
    /// `Ok(index)` if a group starts with `character`, otherwise
    /// `Err(insertion_index)`.
    pub fn find_index_of_char(&self, character: char) -> std::result::Result<usize, usize> {
        self.groups
            .binary_search_by(|group| group.first_char().cmp(&character))
    }

    /// Whether groups are strictly ascending by first character.
    pub fn is_ordered(&self) -> bool {
        self.groups
            .windows(2)
            .all(|pair| pair[0].first_char() < pair[1].first_char())
    }
}

/// A dictionary that can fuse heads of words for compression.
#[derive(Debug, Clone)]
pub struct FusionDictionary {
    nodes: Vec<Node>,
    root: NodeId,
    options: DictionaryOptions,
}

impl Default for FusionDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionDictionary {
    pub fn new() -> Self {
        Self::with_options(DictionaryOptions::default())
    }

    pub fn with_options(options: DictionaryOptions) -> Self {
        Self {
            nodes: vec![Node::default()],
            root: NodeId(0),
            options,
        }
    }

    /// Assembles a dictionary from nodes built elsewhere (the binary reader).
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId, options: DictionaryOptions) -> Self {
        Self {
            nodes,
            root,
            options,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn options(&self) -> DictionaryOptions {
        self.options
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn group(&self, group: GroupRef) -> &CharGroup {
        &self.nodes[group.node.0].groups[group.index]
    }

    pub(crate) fn alloc_node(nodes: &mut Vec<Node>, node: Node) -> NodeId {
        nodes.push(node);
        NodeId(nodes.len() - 1)
    }

    /// Adds a word with its frequency and associated words.
    ///
    /// Associated words missing from the dictionary are first added as
    /// placeholders of frequency 0. Adding a word that already exists with a
    /// non-zero frequency is an error; adding over a placeholder (or over a
    /// non-terminal prefix) promotes it.
    ///
    /// # Errors
    /// - `EmptyWord` for an empty word or associated word
    /// - `FrequencyOutOfRange` if `frequency` is above 255
    /// - `BigramFrequencyOutOfRange` if an associated word frequency is above 15
    /// - `DuplicateWord` if the word is already a real terminal
    pub fn add(&mut self, word: &str, frequency: u32, bigrams: Vec<WeightedString>) -> Result<()> {
        let chars: Vec<char> = word.chars().collect();
        if chars.is_empty() {
            return Err(MakedictError::EmptyWord);
        }
        if frequency > MAX_TERMINAL_FREQUENCY {
            return Err(MakedictError::FrequencyOutOfRange {
                word: word.to_string(),
                frequency,
            });
        }
        for bigram in &bigrams {
            if bigram.word.is_empty() {
                return Err(MakedictError::EmptyWord);
            }
            if bigram.frequency > MAX_BIGRAM_FREQUENCY {
                return Err(MakedictError::BigramFrequencyOutOfRange {
                    word: bigram.word.clone(),
                    frequency: bigram.frequency,
                });
            }
        }
        if self.frequency(word).is_some_and(|existing| existing > 0) {
            return Err(MakedictError::DuplicateWord(word.to_string()));
        }

        for bigram in &bigrams {
            if !self.contains(&bigram.word) {
                let target: Vec<char> = bigram.word.chars().collect();
                self.insert(&target, 0, Vec::new())?;
            }
        }
        self.insert(&chars, frequency as u8, bigrams)
    }

    fn insert(&mut self, word: &[char], frequency: u8, bigrams: Vec<WeightedString>) -> Result<()> {
        let mut node_id = self.root;
        let mut char_index = 0;

        loop {
            let group_index = match self.nodes[node_id.0].find_index_of_char(word[char_index]) {
                Ok(index) => index,
                Err(insertion_index) => {
                    // No group accepts the word here: the whole suffix becomes one group.
                    let group = CharGroup::new(
                        word[char_index..].to_vec(),
                        Some(frequency),
                        bigrams,
                        None,
                    );
                    let node = &mut self.nodes[node_id.0];
                    node.groups.insert(insertion_index, group);
                    debug_assert!(node.is_ordered());
                    return Ok(());
                }
            };

            let (common, run_length, children) = {
                let group = &self.nodes[node_id.0].groups[group_index];
                (
                    common_prefix_length(&group.chars, &word[char_index..]),
                    group.chars.len(),
                    group.children,
                )
            };

            if common < run_length {
                self.split_group(
                    node_id,
                    group_index,
                    common,
                    &word[char_index..],
                    frequency,
                    bigrams,
                );
                return Ok(());
            }

            char_index += run_length;
            if char_index == word.len() {
                let group = &mut self.nodes[node_id.0].groups[group_index];
                if let Some(existing) = group.frequency {
                    if existing > 0 {
                        return Err(MakedictError::DuplicateWord(word.iter().collect()));
                    }
                }
                group.frequency = Some(frequency);
                group.bigrams = bigrams;
                return Ok(());
            }

            match children {
                Some(child) => node_id = child,
                None => {
                    let group = CharGroup::new(
                        word[char_index..].to_vec(),
                        Some(frequency),
                        bigrams,
                        None,
                    );
                    let child = Self::alloc_node(&mut self.nodes, Node::with_groups(vec![group]));
                    self.nodes[node_id.0].groups[group_index].children = Some(child);
                    return Ok(());
                }
            }
        }
    }

    /// Splits the group at `group_index` after `common` characters.
    ///
    /// The group keeps the shared prefix and gets a fresh child node holding
    /// the old tail (with the old frequency, bigrams and children) and, unless
    /// the new word ends exactly at the split, the new word's tail.
    fn split_group(
        &mut self,
        node_id: NodeId,
        group_index: usize,
        common: usize,
        suffix: &[char],
        frequency: u8,
        bigrams: Vec<WeightedString>,
    ) {
        let old_tail = {
            let group = &mut self.nodes[node_id.0].groups[group_index];
            let tail_chars = group.chars.split_off(common);
            CharGroup::new(
                tail_chars,
                group.frequency.take(),
                mem::take(&mut group.bigrams),
                group.children.take(),
            )
        };

        let mut new_groups = vec![old_tail];
        let mut parent_terminal = None;
        if suffix.len() == common {
            parent_terminal = Some((frequency, bigrams));
        } else {
            let new_tail =
                CharGroup::new(suffix[common..].to_vec(), Some(frequency), bigrams, None);
            if new_tail.first_char() > new_groups[0].first_char() {
                new_groups.push(new_tail);
            } else {
                new_groups.insert(0, new_tail);
            }
        }

        let child = Self::alloc_node(&mut self.nodes, Node::with_groups(new_groups));
        let parent = &mut self.nodes[node_id.0].groups[group_index];
        parent.children = Some(child);
        if let Some((frequency, bigrams)) = parent_terminal {
            parent.frequency = Some(frequency);
            parent.bigrams = bigrams;
        }
    }

    /// Finds the group whose path spells exactly `word`, terminal or not.
    pub fn find_group(&self, word: &str) -> Option<GroupRef> {
        let chars: Vec<char> = word.chars().collect();
        if chars.is_empty() {
            return None;
        }
        let mut node_id = self.root;
        let mut index = 0;
        loop {
            let node = &self.nodes[node_id.0];
            let group_index = node.find_index_of_char(chars[index]).ok()?;
            let group = &node.groups[group_index];
            let end = index + group.chars.len();
            if end > chars.len() || group.chars[..] != chars[index..end] {
                return None;
            }
            if end == chars.len() {
                return Some(GroupRef {
                    node: node_id,
                    index: group_index,
                });
            }
            node_id = group.children?;
            index = end;
        }
    }

    pub fn find_word(&self, word: &str) -> Option<&CharGroup> {
        self.find_group(word).map(|group| self.group(group))
    }

    /// Whether `word` is a terminal of this dictionary (placeholders included).
    pub fn contains(&self, word: &str) -> bool {
        self.find_word(word).is_some_and(CharGroup::is_terminal)
    }

    pub fn frequency(&self, word: &str) -> Option<u8> {
        self.find_word(word).and_then(CharGroup::frequency)
    }

    pub fn bigrams(&self, word: &str) -> Option<&[WeightedString]> {
        self.find_word(word)
            .filter(|group| group.is_terminal())
            .map(CharGroup::bigrams)
    }

    /// Number of groups reachable from the root.
    pub fn count_char_groups(&self) -> usize {
        self.reachable_nodes()
            .map(|id| self.nodes[id.0].groups.len())
            .sum()
    }

    /// Number of nodes reachable from the root, root included.
    pub fn count_nodes(&self) -> usize {
        self.reachable_nodes().count()
    }

    fn reachable_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].groups.iter().filter_map(|g| g.children));
            Some(id)
        })
    }

    /// Iterates over all terminal words in ascending code point order.
    pub fn iter(&self) -> WordIterator<'_> {
        WordIterator::new(self)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a FusionDictionary {
    type Item = Word;
    type IntoIter = WordIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Length of the common prefix of a group run and the rest of a word.
fn common_prefix_length(run: &[char], word: &[char]) -> usize {
    run.iter()
        .zip(word)
        .take_while(|(a, b)| a == b)
        .count()
}
