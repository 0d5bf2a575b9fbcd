//! Address and size computation for a flattened node list.
//!
//! The size of a node depends on how many bytes its offsets take, which
//! depends on where its targets land, which depends on the size of every
//! node before them. The loop is broken by relaxation:
//!
//! 1. size every node as if each offset took 3 bytes, and stack them;
//! 2. re-measure every node with the offsets those addresses give;
//! 3. stack again, and go back to 2 until no size changes.
//!
//! Every pass measures both ends of an offset in the layout of the pass
//! before, where the bytes between them can only have shrunk. A size may
//! therefore never grow from one pass to the next; a growing node is a bug
//! and aborts the computation.

use std::collections::HashMap;

use log::{debug, info};

use crate::makedict::codec::address::address_width;
use crate::makedict::codec::chars::group_characters_size;
use crate::makedict::dictionary::{CharGroup, FusionDictionary, GroupRef, NodeId};
use crate::makedict::format::{
    GROUP_ATTRIBUTE_FLAGS_SIZE, GROUP_ATTRIBUTE_MAX_ADDRESS_SIZE, GROUP_COUNT_SIZE,
    GROUP_FLAGS_SIZE, GROUP_FREQUENCY_SIZE, GROUP_MAX_ADDRESS_SIZE, MAX_ADDRESS,
};
use crate::makedict::types::error::{MakedictError, Result};

/// Outcome of [`compute_addresses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionReport {
    /// Number of relaxation passes, the final (unchanged) one included.
    pub passes: usize,
    /// Node stream size with every offset at its maximum width.
    pub initial_size: usize,
    pub final_size: usize,
    /// Node stream size after each pass.
    pub pass_sizes: Vec<usize>,
}

/// Target group of every associated word, resolved once per layout.
///
/// Indexed by node, then group index, then position in the group's list.
#[derive(Debug, Clone, Default)]
pub struct BigramTargets {
    targets: HashMap<NodeId, Vec<Vec<GroupRef>>>,
}

impl BigramTargets {
    /// Looks up the group of every associated word of the listed nodes.
    ///
    /// # Errors
    /// `LayoutInvariant` if an associated word is not a terminal of `dict`.
    pub fn resolve(dict: &FusionDictionary, flat: &[NodeId]) -> Result<Self> {
        let mut targets = HashMap::with_capacity(flat.len());
        for &id in flat {
            let mut per_group = Vec::with_capacity(dict.node(id).groups().len());
            for group in dict.node(id).groups() {
                let refs = group
                    .bigrams()
                    .iter()
                    .map(|bigram| {
                        dict.find_group(&bigram.word)
                            .filter(|found| dict.group(*found).is_terminal())
                            .ok_or_else(|| {
                                MakedictError::LayoutInvariant(format!(
                                    "Associated word {:?} is not in the dictionary",
                                    bigram.word
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                per_group.push(refs);
            }
            targets.insert(id, per_group);
        }
        Ok(Self { targets })
    }

    pub fn group_targets(&self, node: NodeId, index: usize) -> &[GroupRef] {
        self.targets
            .get(&node)
            .and_then(|groups| groups.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Size of the fields every group starts with: flags, characters,
/// terminator and frequency.
pub(crate) fn group_fixed_size(group: &CharGroup) -> usize {
    let mut size = GROUP_FLAGS_SIZE + group_characters_size(group.chars());
    if group.is_terminal() {
        size += GROUP_FREQUENCY_SIZE;
    }
    size
}

/// Size of a group once its offsets take the given widths.
fn group_size_with(group: &CharGroup, widths: &[usize]) -> usize {
    group_fixed_size(group)
        + group.bigrams().len() * GROUP_ATTRIBUTE_FLAGS_SIZE
        + widths.iter().sum::<usize>()
}

/// Offsets of any magnitude are measured here; the writer rejects the ones
/// that do not fit once the layout is final.
fn offset_width(offset: i64) -> usize {
    address_width(offset).unwrap_or(GROUP_MAX_ADDRESS_SIZE)
}

fn cached_address(address: Option<usize>, what: &str) -> Result<usize> {
    address.ok_or_else(|| MakedictError::LayoutInvariant(format!("{} has no address yet", what)))
}

/// Sizes a node assuming 3-byte offsets everywhere.
fn set_node_maximum_size(dict: &mut FusionDictionary, id: NodeId) {
    let node = dict.node_mut(id);
    let mut size = GROUP_COUNT_SIZE;
    for group in &mut node.groups {
        let mut widths = Vec::with_capacity(1 + group.bigrams.len());
        widths.push(GROUP_MAX_ADDRESS_SIZE);
        widths.extend(
            std::iter::repeat(GROUP_ATTRIBUTE_MAX_ADDRESS_SIZE).take(group.bigrams.len()),
        );
        let group_size = group_size_with(group, &widths);
        group.offset_widths = widths;
        group.cached_size = Some(group_size);
        size += group_size;
    }
    node.cached_size = Some(size);
}

/// Measures a node with the offsets the current cached addresses give.
///
/// Both ends of every offset are located in the current layout, using the
/// widths that layout was stacked with. Distances there can only shrink
/// from one layout to the next, and so can the widths.
///
/// Group sizes and widths are stored and the node size is returned; the
/// node's own cached size is left for the caller to compare against.
fn compute_actual_node_size(
    dict: &mut FusionDictionary,
    id: NodeId,
    targets: &BigramTargets,
) -> Result<usize> {
    let mut size = GROUP_COUNT_SIZE;
    let mut measured = Vec::with_capacity(dict.node(id).groups().len());

    for (index, group) in dict.node(id).groups().iter().enumerate() {
        let group_targets = targets.group_targets(id, index);
        if group.offset_widths.len() != 1 + group_targets.len() {
            return Err(MakedictError::LayoutInvariant(format!(
                "Group {} of a node was never sized",
                index
            )));
        }
        let mut position = cached_address(group.cached_address, "Group")? + group_fixed_size(group);
        let mut widths = Vec::with_capacity(group.offset_widths.len());

        widths.push(match group.children() {
            Some(child) => {
                let child_address = cached_address(dict.node(child).cached_address, "Child node")?;
                offset_width(child_address as i64 - position as i64)
            }
            None => 0,
        });
        position += group.offset_widths[0];

        for (target, &old_width) in group_targets.iter().zip(&group.offset_widths[1..]) {
            position += GROUP_ATTRIBUTE_FLAGS_SIZE;
            let target_address =
                cached_address(dict.group(*target).cached_address, "Bigram target")?;
            widths.push(offset_width(target_address as i64 - position as i64));
            position += old_width;
        }

        let group_size = group_size_with(group, &widths);
        size += group_size;
        measured.push((widths, group_size));
    }

    for (group, (widths, group_size)) in dict.node_mut(id).groups.iter_mut().zip(measured) {
        group.offset_widths = widths;
        group.cached_size = Some(group_size);
    }
    Ok(size)
}

/// Lays nodes end to end from address 0 and places each group.
///
/// Returns the total size of the node stream.
fn stack_nodes(dict: &mut FusionDictionary, flat: &[NodeId]) -> Result<usize> {
    let mut node_offset = 0;
    for &id in flat {
        let node = dict.node_mut(id);
        node.cached_address = Some(node_offset);
        let mut group_offset = 0;
        for group in &mut node.groups {
            group.cached_address = Some(node_offset + GROUP_COUNT_SIZE + group_offset);
            group_offset += group.cached_size.unwrap_or(0);
        }
        let node_size = node.cached_size.unwrap_or(0);
        if group_offset + GROUP_COUNT_SIZE != node_size {
            return Err(MakedictError::LayoutInvariant(format!(
                "Stored and computed node size differ: {} vs {}",
                node_size,
                group_offset + GROUP_COUNT_SIZE
            )));
        }
        node_offset += node_size;
    }
    Ok(node_offset)
}

/// Runs one relaxation pass: re-measure every node, then re-stack.
///
/// Returns whether any node changed size. On a layout that already reached
/// its fixed point this returns `false` and leaves every address as it was.
///
/// # Errors
/// `LayoutInvariant` if a node grew.
pub fn relax_pass(
    dict: &mut FusionDictionary,
    flat: &[NodeId],
    targets: &BigramTargets,
) -> Result<bool> {
    let mut changed = false;
    for &id in flat {
        let old_size = dict.node(id).cached_size.unwrap_or(usize::MAX);
        let new_size = compute_actual_node_size(dict, id, targets)?;
        if new_size > old_size {
            return Err(MakedictError::LayoutInvariant(format!(
                "Node size increased from {} to {}",
                old_size, new_size
            )));
        }
        if new_size != old_size {
            changed = true;
        }
        dict.node_mut(id).cached_size = Some(new_size);
    }
    stack_nodes(dict, flat)?;
    Ok(changed)
}

/// Computes the final size and address of every listed node and group.
///
/// The order of `flat` is taken as is; this only works out the sizes that
/// order gives.
///
/// # Errors
/// - `LayoutInvariant` if an associated word cannot be found or a pass
///   grows a node
/// - `DictionaryTooLarge` if the result does not fit 24-bit offsets
pub fn compute_addresses(dict: &mut FusionDictionary, flat: &[NodeId]) -> Result<CompactionReport> {
    let targets = BigramTargets::resolve(dict, flat)?;
    compute_addresses_with(dict, flat, &targets)
}

pub fn compute_addresses_with(
    dict: &mut FusionDictionary,
    flat: &[NodeId],
    targets: &BigramTargets,
) -> Result<CompactionReport> {
    for &id in flat {
        set_node_maximum_size(dict, id);
    }
    let initial_size = stack_nodes(dict, flat)?;
    info!("Compressing the array addresses. Original size: {}", initial_size);

    let mut pass_sizes = Vec::new();
    loop {
        let changed = relax_pass(dict, flat, targets)?;
        let size = stream_size(dict, flat);
        debug!("Pass {}: {} bytes", pass_sizes.len() + 1, size);
        pass_sizes.push(size);
        if !changed {
            break;
        }
    }

    let final_size = stream_size(dict, flat);
    if final_size > MAX_ADDRESS {
        return Err(MakedictError::DictionaryTooLarge { size: final_size });
    }
    info!(
        "Compression complete in {} passes. After address compression: {}",
        pass_sizes.len(),
        final_size
    );

    Ok(CompactionReport {
        passes: pass_sizes.len(),
        initial_size,
        final_size,
        pass_sizes,
    })
}

/// End address of the last listed node.
fn stream_size(dict: &FusionDictionary, flat: &[NodeId]) -> usize {
    flat.last()
        .map(|&id| {
            let node = dict.node(id);
            node.cached_address.unwrap_or(0) + node.cached_size.unwrap_or(0)
        })
        .unwrap_or(0)
}

/// Checks that every node starts where the previous one ends.
pub fn flat_layout_check(dict: &FusionDictionary, flat: &[NodeId]) -> Result<()> {
    let mut offset = 0;
    for (index, &id) in flat.iter().enumerate() {
        let node = dict.node(id);
        if node.cached_address != Some(offset) {
            return Err(MakedictError::LayoutInvariant(format!(
                "Wrong address for node {}: expected {}, got {:?}",
                index, offset, node.cached_address
            )));
        }
        offset += node.cached_size.unwrap_or(0);
    }
    Ok(())
}
