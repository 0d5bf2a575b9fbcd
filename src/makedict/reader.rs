//! Reconstruction of a [`FusionDictionary`] from its binary form.
//!
//! Nodes are parsed depth first from the root. Associated words are stored
//! as addresses of their target group, so their text is recovered by walking
//! down from the root towards that address, concatenating runs on the way.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::ReadBytesExt;
use log::{info, trace};

use super::dictionary::{CharGroup, FusionDictionary, Node, NodeId};
use super::format::group::{read_group, GroupInfo};
use super::format::{header, GROUP_COUNT_SIZE, MAX_CHARGROUPS_IN_A_NODE};
use super::types::error::{MakedictError, Result};
use super::types::models::{DictionaryHeader, WeightedString};

/// Reads just the header of a dictionary.
pub fn read_header<R: Read>(source: &mut R) -> Result<DictionaryHeader> {
    header::parse(source)
}

/// Reads a whole dictionary from `source`, positioned at its magic number.
///
/// # Errors
/// - `BadMagic` / `UnsupportedVersion` / `InvalidFormat` for malformed input
/// - `Io` if the source fails or ends early
pub fn read_dictionary<R: Read + Seek>(source: &mut R) -> Result<FusionDictionary> {
    info!("Reading binary dictionary");
    let header = header::parse(source)?;
    let header_size = source.stream_position()?;

    let mut reader = NodeReader {
        source,
        header_size,
        nodes: Vec::new(),
        cache: HashMap::new(),
    };
    let root = reader.read_node(0)?;
    let nodes = reader.nodes;
    info!("Read {} nodes", nodes.len());

    Ok(FusionDictionary::from_parts(nodes, root, header.options))
}

/// Reads a dictionary held in memory.
pub fn from_bytes(bytes: &[u8]) -> Result<FusionDictionary> {
    read_dictionary(&mut Cursor::new(bytes))
}

/// Opens and reads a dictionary file.
pub fn read_dictionary_file<P: AsRef<Path>>(path: P) -> Result<FusionDictionary> {
    let path = path.as_ref();
    info!("Opening dictionary file: {}", path.display());
    let mut file = BufReader::new(File::open(path)?);
    read_dictionary(&mut file)
}

struct NodeReader<'a, R> {
    source: &'a mut R,
    header_size: u64,
    nodes: Vec<Node>,
    /// Nodes already parsed, by address.
    cache: HashMap<usize, NodeId>,
}

/// A node whose groups are still being read.
struct PendingNode {
    address: usize,
    remaining: usize,
    next_group: usize,
    groups: Vec<CharGroup>,
    /// Group whose children node is being read.
    waiting: Option<CharGroup>,
}

impl PendingNode {
    fn attach(&mut self, children: NodeId) {
        if let Some(mut group) = self.waiting.take() {
            group.children = Some(children);
            self.groups.push(group);
        }
    }
}

impl<'a, R: Read + Seek> NodeReader<'a, R> {
    fn seek_to(&mut self, address: usize) -> Result<()> {
        self.source
            .seek(SeekFrom::Start(self.header_size + address as u64))?;
        Ok(())
    }

    fn read_count(&mut self, address: usize) -> Result<usize> {
        self.seek_to(address)?;
        let count = self.source.read_u8()? as usize;
        if count > MAX_CHARGROUPS_IN_A_NODE {
            return Err(MakedictError::InvalidFormat(format!(
                "Node at {} has a group count over {} ({})",
                address, MAX_CHARGROUPS_IN_A_NODE, count
            )));
        }
        Ok(count)
    }

    fn open_node(&mut self, address: usize) -> Result<PendingNode> {
        let count = self.read_count(address)?;
        trace!("Node at {}: {} groups", address, count);
        Ok(PendingNode {
            address,
            remaining: count,
            next_group: address + GROUP_COUNT_SIZE,
            groups: Vec::with_capacity(count),
            waiting: None,
        })
    }

    fn close_node(&mut self, pending: PendingNode) -> NodeId {
        let mut node = Node::with_groups(pending.groups);
        node.cached_address = Some(pending.address);
        let id = FusionDictionary::alloc_node(&mut self.nodes, node);
        self.cache.insert(pending.address, id);
        id
    }

    /// Parses the node at `address` and everything below it.
    ///
    /// Children are allocated before their parents. Nodes under parse are
    /// kept on an explicit stack, so the depth of the trie is not bounded
    /// by the call stack.
    fn read_node(&mut self, address: usize) -> Result<NodeId> {
        if let Some(&id) = self.cache.get(&address) {
            return Ok(id);
        }

        let mut stack = vec![self.open_node(address)?];
        while let Some(mut pending) = stack.pop() {
            if pending.remaining == 0 {
                let id = self.close_node(pending);
                match stack.last_mut() {
                    Some(parent) => parent.attach(id),
                    None => return Ok(id),
                }
                continue;
            }

            let group_address = pending.next_group;
            self.seek_to(group_address)?;
            let info = read_group(self.source, group_address)?;

            if let Some(previous) = pending.groups.last() {
                if previous.first_char() >= info.chars[0] {
                    return Err(MakedictError::InvalidFormat(format!(
                        "Groups of node at {} are not in character order",
                        pending.address
                    )));
                }
            }

            let mut bigrams = Vec::with_capacity(info.bigrams.len());
            for attribute in &info.bigrams {
                let word = self.word_at_address(attribute.address)?;
                bigrams.push(WeightedString::new(word, attribute.frequency));
            }

            pending.next_group = info.end_address;
            pending.remaining -= 1;
            let mut group = CharGroup::new(info.chars, info.frequency, bigrams, None);

            match info.children_address {
                Some(children_address) if children_address < info.end_address => {
                    return Err(MakedictError::InvalidFormat(format!(
                        "Group at {} has children at {}, before its own end",
                        group_address, children_address
                    )));
                }
                Some(children_address) => match self.cache.get(&children_address) {
                    Some(&id) => {
                        group.children = Some(id);
                        pending.groups.push(group);
                        stack.push(pending);
                    }
                    None => {
                        pending.waiting = Some(group);
                        stack.push(pending);
                        stack.push(self.open_node(children_address)?);
                    }
                },
                None => {
                    pending.groups.push(group);
                    stack.push(pending);
                }
            }
        }

        Err(MakedictError::InvalidFormat(format!(
            "Node at {} could not be parsed",
            address
        )))
    }

    /// Finds the word whose group starts at `target`.
    ///
    /// The cursor is restored afterwards.
    fn word_at_address(&mut self, target: usize) -> Result<String> {
        let saved = self.source.stream_position()?;
        let word = self.walk_to(target);
        self.source.seek(SeekFrom::Start(saved))?;
        word
    }

    fn walk_to(&mut self, target: usize) -> Result<String> {
        let mut word = String::new();
        let mut node_address = 0;
        loop {
            let count = self.read_count(node_address)?;
            let mut group_address = node_address + GROUP_COUNT_SIZE;
            // Subtrees are laid out in group order, so the target lives under
            // the last group whose children start at or before it.
            let mut last: Option<GroupInfo> = None;
            for _ in 0..count {
                if group_address > target {
                    break;
                }
                let info = read_group(self.source, group_address)?;
                if info.original_address == target {
                    word.extend(info.chars.iter());
                    return Ok(word);
                }
                group_address = info.end_address;
                if matches!(info.children_address, Some(children) if children <= target) {
                    last = Some(info);
                }
            }

            let info = last.ok_or_else(|| {
                MakedictError::InvalidFormat(format!("No word starts at address {}", target))
            })?;
            let next = info.children_address.unwrap_or(node_address);
            if next <= node_address {
                return Err(MakedictError::InvalidFormat(format!(
                    "Address {} cannot be reached from the root",
                    target
                )));
            }
            word.extend(info.chars.iter());
            node_address = next;
        }
    }
}
