//! Serialization of a [`FusionDictionary`] to the binary format.

use std::io::Write;

use log::{debug, info};

use super::codec::address::{attribute_flags, address_width, group_address_flags, write_address};
use super::codec::chars::write_char_array;
use super::dictionary::{FusionDictionary, NodeId};
use super::format::{
    header, FLAG_HAS_BIGRAMS, FLAG_HAS_MULTIPLE_CHARS, FLAG_IS_TERMINAL,
    GROUP_ATTRIBUTE_FLAGS_SIZE, GROUP_CHARACTERS_TERMINATOR, MAX_CHARGROUPS_IN_A_NODE,
};
use super::layout::compaction::group_fixed_size;
use super::layout::{
    compute_addresses_with, flat_layout_check, flatten_tree, BigramTargets, LayoutStatistics,
};
use super::types::error::{MakedictError, Result};

/// Serializes `dict` into a byte buffer, header included.
///
/// Sizes and addresses computed along the way stay cached on the nodes,
/// which is why the dictionary is borrowed mutably.
///
/// # Errors
/// - `TooManyGroups` if a node holds more than 127 groups
/// - `DictionaryTooLarge` if the node stream exceeds 16 MiB
/// - `LayoutInvariant` if the computed layout is inconsistent
pub fn to_bytes(dict: &mut FusionDictionary) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    header::write(&mut buffer, dict.options())?;

    info!("Flattening the tree...");
    let flat = flatten_tree(dict);

    info!("Computing addresses...");
    let targets = BigramTargets::resolve(dict, &flat)?;
    let report = compute_addresses_with(dict, &flat, &targets)?;
    info!("Checking array...");
    flat_layout_check(dict, &flat)?;

    info!("Writing file...");
    let mut stream = Vec::with_capacity(report.final_size);
    for &id in &flat {
        write_placed_node(dict, &targets, &mut stream, id)?;
    }
    if stream.len() != report.final_size {
        return Err(MakedictError::LayoutInvariant(format!(
            "Wrote {} bytes, expected {}",
            stream.len(),
            report.final_size
        )));
    }

    LayoutStatistics::collect(dict, &flat).log();

    buffer.extend_from_slice(&stream);
    info!("Done: {} bytes", buffer.len());
    Ok(buffer)
}

/// Serializes `dict` and writes it to `dest`.
pub fn write_dictionary<W: Write>(dest: &mut W, dict: &mut FusionDictionary) -> Result<()> {
    let bytes = to_bytes(dict)?;
    dest.write_all(&bytes)?;
    dest.flush()?;
    Ok(())
}

/// Appends one node to `stream`, which must end exactly at the node's
/// cached address.
fn write_placed_node(
    dict: &FusionDictionary,
    targets: &BigramTargets,
    stream: &mut Vec<u8>,
    id: NodeId,
) -> Result<()> {
    let node = dict.node(id);
    let node_address = node.cached_address().unwrap_or(0);
    let count = node.groups().len();
    if count > MAX_CHARGROUPS_IN_A_NODE {
        return Err(MakedictError::TooManyGroups { count });
    }
    stream.push(count as u8);

    for (index, group) in node.groups().iter().enumerate() {
        let group_address = stream.len();
        if group.cached_address() != Some(group_address) {
            return Err(MakedictError::LayoutInvariant(format!(
                "Write index {} is not the cached address {:?} of the group",
                group_address,
                group.cached_address()
            )));
        }

        let base = group_address + group_fixed_size(group);
        let children_offset = match group.children() {
            Some(child) => {
                let child_address = dict.node(child).cached_address().unwrap_or(0);
                if child_address <= base {
                    return Err(MakedictError::LayoutInvariant(format!(
                        "Children of group at {} are not placed after it",
                        group_address
                    )));
                }
                Some((child_address - base) as i64)
            }
            None => None,
        };
        let children_width = match children_offset {
            Some(offset) => address_width(offset)?,
            None => 0,
        };

        let bigram_targets = targets.group_targets(id, index);
        let mut flags = group_address_flags(children_width)?;
        if group.has_several_chars() {
            flags |= FLAG_HAS_MULTIPLE_CHARS;
        }
        if group.is_terminal() {
            flags |= FLAG_IS_TERMINAL;
        }
        if !bigram_targets.is_empty() {
            flags |= FLAG_HAS_BIGRAMS;
        }

        stream.push(flags);
        write_char_array(stream, group.chars())?;
        if group.has_several_chars() {
            stream.push(GROUP_CHARACTERS_TERMINATOR);
        }
        if let Some(frequency) = group.frequency() {
            stream.push(frequency);
        }
        if let Some(offset) = children_offset {
            write_address(stream, offset as u32, children_width)?;
        }

        let remaining = bigram_targets.len();
        for (position, (target, bigram)) in bigram_targets.iter().zip(group.bigrams()).enumerate() {
            let target_address = dict.group(*target).cached_address().unwrap_or(0);
            let attribute_base = stream.len() + GROUP_ATTRIBUTE_FLAGS_SIZE;
            let offset = target_address as i64 - attribute_base as i64;
            let more = position + 1 < remaining;
            stream.push(attribute_flags(more, offset, bigram.frequency)?);
            write_address(stream, offset.unsigned_abs() as u32, address_width(offset)?)?;
        }

        if Some(stream.len() - group_address) != group.cached_size() {
            return Err(MakedictError::LayoutInvariant(format!(
                "Group at {} took {} bytes instead of {:?}",
                group_address,
                stream.len() - group_address,
                group.cached_size()
            )));
        }
    }

    let written = stream.len() - node_address;
    if Some(written) != node.cached_size() {
        return Err(MakedictError::LayoutInvariant(format!(
            "Wrote {} bytes of a node that should have {:?} bytes",
            written,
            node.cached_size()
        )));
    }
    debug!("Node at {}: {} groups, {} bytes", node_address, count, written);
    Ok(())
}
