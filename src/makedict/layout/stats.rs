//! Informative figures about a laid out node list.

use log::debug;

use crate::makedict::dictionary::{FusionDictionary, NodeId};

/// Size and shape of a compacted dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutStatistics {
    pub total_size: usize,
    pub node_count: usize,
    pub group_count: usize,
    /// Lowest address of a node holding a terminal group.
    pub first_terminal_address: Option<usize>,
    /// Highest address of a node holding a terminal group.
    pub last_terminal_address: Option<usize>,
    /// `group_count_histogram[n]` is the number of nodes with `n` groups.
    pub group_count_histogram: Vec<usize>,
    /// `run_length_histogram[n]` is the number of groups with `n` characters.
    pub run_length_histogram: Vec<usize>,
}

impl LayoutStatistics {
    /// Gathers statistics over nodes whose addresses and sizes are computed.
    pub fn collect(dict: &FusionDictionary, flat: &[NodeId]) -> Self {
        let mut stats = Self {
            node_count: flat.len(),
            ..Self::default()
        };

        for &id in flat {
            let node = dict.node(id);
            let address = node.cached_address().unwrap_or(0);
            let groups = node.groups();

            bump(&mut stats.group_count_histogram, groups.len());
            stats.group_count += groups.len();
            for group in groups {
                bump(&mut stats.run_length_histogram, group.chars().len());
                if group.is_terminal() {
                    stats.first_terminal_address =
                        Some(stats.first_terminal_address.map_or(address, |a| a.min(address)));
                    stats.last_terminal_address =
                        Some(stats.last_terminal_address.map_or(address, |a| a.max(address)));
                }
            }
            stats.total_size = stats
                .total_size
                .max(address + node.cached_size().unwrap_or(0));
        }
        stats
    }

    pub fn groups_per_node(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.group_count as f64 / self.node_count as f64
        }
    }

    /// Dumps the statistics at debug level.
    pub fn log(&self) {
        debug!(
            "Statistics: total size {}, {} nodes, {} groups ({:.2} groups per node)",
            self.total_size,
            self.node_count,
            self.group_count,
            self.groups_per_node()
        );
        debug!(
            "Terminals: first at {:?}, last at {:?}",
            self.first_terminal_address, self.last_terminal_address
        );
        debug!(
            "Group stats: max = {}",
            self.group_count_histogram.len().saturating_sub(1)
        );
        for (count, nodes) in self.group_count_histogram.iter().enumerate() {
            debug!("    {} : {}", count, nodes);
        }
        debug!(
            "Character run stats: max = {}",
            self.run_length_histogram.len().saturating_sub(1)
        );
        for (length, groups) in self.run_length_histogram.iter().enumerate() {
            debug!("    {} : {}", length, groups);
        }
    }
}

fn bump(histogram: &mut Vec<usize>, slot: usize) {
    if histogram.len() <= slot {
        histogram.resize(slot + 1, 0);
    }
    histogram[slot] += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::makedict::layout::{compute_addresses, flatten_tree};

    #[test]
    fn counts_groups_and_runs() {
        let mut dict = FusionDictionary::new();
        for word in ["cat", "car", "dog"] {
            dict.add(word, 1, vec![]).unwrap();
        }
        let flat = flatten_tree(&dict);
        let report = compute_addresses(&mut dict, &flat).unwrap();
        let stats = LayoutStatistics::collect(&dict, &flat);

        assert_eq!(stats.total_size, report.final_size);
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.group_count, 4);
        assert_eq!(stats.group_count_histogram, vec![0, 0, 2]);
        // "r" and "t" are single characters, "ca" and "dog" are runs.
        assert_eq!(stats.run_length_histogram, vec![0, 2, 1, 1]);
        assert_eq!(stats.first_terminal_address, Some(0));
        assert_eq!(stats.last_terminal_address, dict.node(flat[1]).cached_address());
        assert!((stats.groups_per_node() - 2.0).abs() < f64::EPSILON);
    }
}
