//! Cluster assignment - turn a tree plus a split log into per-leaf labels.
//!
//! Assignment is a pure function and is recomputed from scratch after every
//! action rather than incrementally patched. Entries are replayed in log
//! order over an all-zero baseline, so when two split points overlap, the
//! one performed later overwrites the earlier one for every leaf it covers.
//! That is deliberate last-write-wins in click order, not tree depth: an
//! ancestor split added after a descendant split erases the descendant's
//! finer distinction.

use std::collections::HashSet;

use crate::linkage::{LinkageTree, OutOfRangeNodeError};
use crate::splits::SplitRegistry;

/// Per-leaf cluster labels for the current split log. Label 0 is the
/// unsplit baseline.
pub fn assign(
    tree: &LinkageTree,
    registry: &SplitRegistry,
) -> Result<Vec<i64>, OutOfRangeNodeError> {
    let mut labels = vec![0i64; tree.leaf_count()];

    for point in registry.iter() {
        let leaves = tree.leaves_under(point.node_id)?;
        for &leaf in leaves.iter() {
            labels[leaf] = point.label;
        }
    }

    Ok(labels)
}

/// Number of distinct labels in an assignment.
pub fn cluster_count(labels: &[i64]) -> usize {
    labels.iter().collect::<HashSet<_>>().len()
}
