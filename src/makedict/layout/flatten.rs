//! Linearization of the trie into the order nodes are written in.

use std::collections::HashSet;

use log::info;

use crate::makedict::dictionary::{FusionDictionary, NodeId};

/// Lists every node reachable from the root exactly once, in pre-order.
///
/// The order only changes how compact the file is, never what it means.
/// A node met a second time is moved to the end instead of being listed
/// twice; with a tree this never happens, but shared subtrees would need it.
pub fn flatten_tree(dict: &FusionDictionary) -> Vec<NodeId> {
    info!("Counted groups: {}", dict.count_char_groups());

    let mut flat = Vec::with_capacity(dict.count_nodes());
    let mut seen = HashSet::new();
    let mut stack = vec![dict.root()];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            flat.retain(|&listed| listed != id);
        }
        flat.push(id);
        // Reversed so the first group's subtree is popped first.
        stack.extend(
            dict.node(id)
                .groups()
                .iter()
                .rev()
                .filter_map(|group| group.children()),
        );
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_comes_first_then_subtrees_in_group_order() {
        let mut dict = FusionDictionary::new();
        for word in ["ab", "abc", "abd", "b", "bc", "c"] {
            dict.add(word, 1, vec![]).unwrap();
        }
        let flat = flatten_tree(&dict);
        assert_eq!(flat[0], dict.root());
        assert_eq!(flat.len(), dict.count_nodes());

        let root = dict.node(dict.root());
        let ab_children = root.groups()[0].children().unwrap();
        let b_children = root.groups()[1].children().unwrap();
        assert_eq!(flat, vec![dict.root(), ab_children, b_children]);
    }

    #[test]
    fn deep_chain_is_listed_parent_before_child() {
        let mut dict = FusionDictionary::new();
        for word in ["a", "ab", "abc", "abcd"] {
            dict.add(word, 1, vec![]).unwrap();
        }
        let flat = flatten_tree(&dict);
        assert_eq!(flat.len(), 4);
        for pair in flat.windows(2) {
            let parent = dict.node(pair[0]);
            assert_eq!(parent.groups()[0].children(), Some(pair[1]));
        }
    }
}
