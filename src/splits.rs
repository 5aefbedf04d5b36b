//! Split registry - the ordered log of user carve actions.
//!
//! This is the only mutable state in the crate. Its discipline is
//! append / filter / clear; an entry is never edited in place, and the
//! surviving entries always keep their original insertion order. Everything
//! downstream (assignment, coloring, summaries) is recomputed from scratch
//! against this log.

use serde::{Deserialize, Serialize};

use crate::linkage::{LinkageTree, OutOfRangeNodeError};

/// One split action: start a new cluster `label` at `node_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPoint {
    pub node_id: usize,
    pub label: i64,
}

/// Append-only log of split points for a tree with a fixed leaf count.
#[derive(Debug, Clone)]
pub struct SplitRegistry {
    max_node_id: usize,
    entries: Vec<SplitPoint>,
}

impl SplitRegistry {
    /// Registry accepting node ids `0..=2n-2` for `leaf_count` leaves.
    pub fn new(leaf_count: usize) -> Self {
        Self {
            max_node_id: 2 * leaf_count.max(1) - 2,
            entries: Vec::new(),
        }
    }

    pub fn for_tree(tree: &LinkageTree) -> Self {
        Self::new(tree.leaf_count())
    }

    /// Append a split action. A rejected add leaves the log untouched.
    pub fn add(&mut self, node_id: usize, label: i64) -> Result<(), OutOfRangeNodeError> {
        if node_id > self.max_node_id {
            return Err(OutOfRangeNodeError {
                node_id,
                max_node_id: self.max_node_id,
            });
        }
        self.entries.push(SplitPoint { node_id, label });
        Ok(())
    }

    /// Label the next split action should get: one past the highest label
    /// handed out so far, starting at 1 for an empty log.
    pub fn next_label(&self) -> i64 {
        self.entries
            .iter()
            .map(|p| p.label)
            .max()
            .map(|m| m + 1)
            .unwrap_or(1)
    }

    /// Drop every entry for `node_id` (removal is by node identity, not by
    /// cluster label). Returns how many entries went away.
    pub fn remove(&mut self, node_id: usize) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.node_id != node_id);
        before - self.entries.len()
    }

    /// Clear the whole log.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Surviving entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SplitPoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row indices currently registered as split points, in log order.
    /// Renderers use these to draw the split markers; leaf-node entries
    /// have no row and are skipped.
    pub fn split_rows(&self, tree: &LinkageTree) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|p| p.node_id >= tree.leaf_count())
            .map(|p| p.node_id - tree.leaf_count())
            .collect()
    }
}
