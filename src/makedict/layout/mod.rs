//! Placement of the trie in the node stream.
//!
//! [`flatten_tree`] decides the order nodes are written in, then
//! [`compute_addresses`] works out how many bytes each node takes and
//! where it lands. Both results are cached on the nodes and groups
//! themselves, for the writer to use.

pub mod compaction;
pub mod flatten;
pub mod stats;

pub use compaction::{
    compute_addresses, compute_addresses_with, flat_layout_check, relax_pass, BigramTargets,
    CompactionReport,
};
pub use flatten::flatten_tree;
pub use stats::LayoutStatistics;
