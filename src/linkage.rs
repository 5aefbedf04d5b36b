//! Linkage tree - validated wrapper around an agglomerative merge history.
//!
//! The tree is never built from raw features here. It consumes a merge
//! history that an external hierarchical-clustering routine already
//! produced: n-1 rows for n leaves, sorted by merge height. Row i creates
//! internal node `n + i`; ids below n are the original observations.
//!
//! The only traversal the rest of the crate needs is "which leaves sit
//! under node X". Split points accumulate on shared subtrees, so the
//! traversal is iterative over the flat row array with a per-node memo
//! cache - O(n) total across all queries of one assignment pass.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One merge event: two child nodes joined at a height.
///
/// `order_index` carries the display-order value the upstream tool attached
/// to this row; nothing in the core computes with it, but it must survive
/// round trips and appear in debug dumps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkageRow {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub order_index: f64,
}

/// Malformed merge history. Raised during construction, before any traversal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTreeError {
    #[error("a linkage tree requires at least one leaf")]
    NoLeaves,
    #[error("expected {expected} linkage rows for {leaves} leaves, got {actual}")]
    RowCount {
        leaves: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row}: child id {child} out of range (ids produced so far end at {max})")]
    ChildOutOfRange { row: usize, child: usize, max: usize },
    #[error("node id {child} appears as a child more than once")]
    DuplicateChild { child: usize },
    #[error("row {row}: height {height} is below the previous row's height")]
    NonMonotonicHeight { row: usize, height: f64 },
}

/// A node id outside `0..=2n-2` for the tree's n leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node id {node_id} out of range (valid ids are 0..={max_node_id})")]
pub struct OutOfRangeNodeError {
    pub node_id: usize,
    pub max_node_id: usize,
}

/// Validated merge history for `leaf_count` observations.
#[derive(Debug)]
pub struct LinkageTree {
    leaf_count: usize,
    rows: Vec<LinkageRow>,
    /// Memoized leaf sets keyed by node id. Filled lazily, never invalidated
    /// (the tree is immutable after construction).
    subtree_cache: RefCell<HashMap<usize, Rc<Vec<usize>>>>,
}

impl LinkageTree {
    /// Validate a merge history and wrap it.
    ///
    /// Checks: exactly n-1 rows, every child id already produced when its
    /// row references it (this also rules out cycles), no id used as a
    /// child twice, heights non-decreasing.
    pub fn new(leaf_count: usize, rows: Vec<LinkageRow>) -> Result<Self, InvalidTreeError> {
        if leaf_count == 0 {
            return Err(InvalidTreeError::NoLeaves);
        }
        let expected = leaf_count - 1;
        if rows.len() != expected {
            return Err(InvalidTreeError::RowCount {
                leaves: leaf_count,
                expected,
                actual: rows.len(),
            });
        }

        let mut seen_children: HashSet<usize> = HashSet::new();
        let mut prev_height = f64::NEG_INFINITY;

        for (i, row) in rows.iter().enumerate() {
            // Row i may only reference leaves and rows merged before it.
            let max_child = leaf_count + i - 1;
            for child in [row.left, row.right] {
                if child > max_child {
                    return Err(InvalidTreeError::ChildOutOfRange {
                        row: i,
                        child,
                        max: max_child,
                    });
                }
                if !seen_children.insert(child) {
                    return Err(InvalidTreeError::DuplicateChild { child });
                }
            }
            if row.height < prev_height {
                return Err(InvalidTreeError::NonMonotonicHeight {
                    row: i,
                    height: row.height,
                });
            }
            prev_height = row.height;
        }

        Ok(Self {
            leaf_count,
            rows,
            subtree_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Highest valid node id: `2n - 2`.
    pub fn max_node_id(&self) -> usize {
        2 * self.leaf_count - 2
    }

    /// Id of the final merge (the whole tree). Equals leaf 0 for a
    /// single-observation tree.
    pub fn root_id(&self) -> usize {
        self.max_node_id()
    }

    pub fn rows(&self) -> &[LinkageRow] {
        &self.rows
    }

    /// Children and height for an internal node id, None for leaves.
    pub fn row_of(&self, node_id: usize) -> Option<&LinkageRow> {
        if node_id < self.leaf_count {
            return None;
        }
        self.rows.get(node_id - self.leaf_count)
    }

    /// All leaf indices in the subtree rooted at `node_id`.
    ///
    /// Leaves resolve to themselves; internal nodes to the union of their
    /// children's leaf sets, left before right. Results are memoized per
    /// node id, so repeated queries over shared subtrees cost nothing
    /// beyond the first walk.
    pub fn leaves_under(&self, node_id: usize) -> Result<Rc<Vec<usize>>, OutOfRangeNodeError> {
        if node_id > self.max_node_id() {
            return Err(OutOfRangeNodeError {
                node_id,
                max_node_id: self.max_node_id(),
            });
        }

        if let Some(hit) = self.subtree_cache.borrow().get(&node_id) {
            return Ok(hit.clone());
        }

        // Iterative post-order fill: a node is resolved once both children
        // are cached, otherwise the missing children are pushed first.
        let mut stack = vec![node_id];
        while let Some(&id) = stack.last() {
            if self.subtree_cache.borrow().contains_key(&id) {
                stack.pop();
                continue;
            }
            if id < self.leaf_count {
                self.subtree_cache
                    .borrow_mut()
                    .insert(id, Rc::new(vec![id]));
                stack.pop();
                continue;
            }

            let row = self.rows[id - self.leaf_count];
            let (left_set, right_set) = {
                let cache = self.subtree_cache.borrow();
                (cache.get(&row.left).cloned(), cache.get(&row.right).cloned())
            };
            match (left_set, right_set) {
                (Some(left), Some(right)) => {
                    let mut merged = Vec::with_capacity(left.len() + right.len());
                    merged.extend_from_slice(&left);
                    merged.extend_from_slice(&right);
                    self.subtree_cache.borrow_mut().insert(id, Rc::new(merged));
                    stack.pop();
                }
                (left, right) => {
                    if left.is_none() {
                        stack.push(row.left);
                    }
                    if right.is_none() {
                        stack.push(row.right);
                    }
                }
            }
        }

        let cache = self.subtree_cache.borrow();
        Ok(cache[&node_id].clone())
    }

    /// User-facing "Node k" label for a row: the root merge is Node 1, the
    /// first (lowest) merge is Node `row_count`. This is the exact
    /// convention renderers put in hover text, so it must not drift.
    pub fn node_label_for_row(&self, row_index: usize) -> Option<usize> {
        if row_index >= self.rows.len() {
            return None;
        }
        Some(self.rows.len() - row_index)
    }

    /// Row index addressed by a 1-based "Node k" label.
    pub fn row_for_node_label(&self, label: usize) -> Option<usize> {
        if label == 0 || label > self.rows.len() {
            return None;
        }
        Some(self.rows.len() - label)
    }

    /// Internal node id addressed by a 1-based "Node k" label.
    pub fn node_id_for_label(&self, label: usize) -> Option<usize> {
        self.row_for_node_label(label)
            .map(|row| self.leaf_count + row)
    }
}

/// Hover-text form of a node label.
pub fn format_node_label(label: usize) -> String {
    format!("Node {}", label)
}

/// Parse hover text like "Node 7" back into the numeric label.
pub fn parse_node_label(text: &str) -> Option<usize> {
    let re = Regex::new(r"^Node\s+(\d+)$").ok()?;
    let caps = re.captures(text.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn row(left: usize, right: usize, height: f64) -> LinkageRow {
        LinkageRow {
            left,
            right,
            height,
            order_index: 0.0,
        }
    }

    /// 5-leaf tree used across the crate's tests:
    ///   row 0: (0, 1)    -> node 5
    ///   row 1: (2, 3)    -> node 6
    ///   row 2: (5, 6)    -> node 7
    ///   row 3: (7, 4)    -> node 8 (root)
    pub(crate) fn five_leaf_tree() -> LinkageTree {
        LinkageTree::new(
            5,
            vec![
                row(0, 1, 0.5),
                row(2, 3, 0.7),
                row(5, 6, 1.2),
                row(7, 4, 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_root_covers_all_leaves() {
        let tree = five_leaf_tree();
        let leaves = tree.leaves_under(tree.root_id()).unwrap();
        let mut sorted: Vec<usize> = leaves.iter().copied().collect();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_leaf_resolves_to_itself() {
        let tree = five_leaf_tree();
        assert_eq!(*tree.leaves_under(3).unwrap(), vec![3]);
    }

    #[test]
    fn test_internal_node_union() {
        let tree = five_leaf_tree();
        assert_eq!(*tree.leaves_under(5).unwrap(), vec![0, 1]);
        assert_eq!(*tree.leaves_under(7).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_leaves_under_out_of_range() {
        let tree = five_leaf_tree();
        let err = tree.leaves_under(9).unwrap_err();
        assert_eq!(err.node_id, 9);
        assert_eq!(err.max_node_id, 8);
    }

    #[test]
    fn test_memoized_results_are_stable() {
        let tree = five_leaf_tree();
        let first = tree.leaves_under(7).unwrap();
        let second = tree.leaves_under(7).unwrap();
        assert_eq!(first, second);
        // Same allocation, not a re-walk.
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_wrong_row_count_rejected() {
        let err = LinkageTree::new(5, vec![row(0, 1, 0.5)]).unwrap_err();
        assert_eq!(
            err,
            InvalidTreeError::RowCount {
                leaves: 5,
                expected: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        // Row 0 references node 6, which row 1 would only produce later.
        let err = LinkageTree::new(
            4,
            vec![row(0, 6, 0.5), row(1, 2, 0.7), row(4, 3, 1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, InvalidTreeError::ChildOutOfRange { row: 0, child: 6, .. }));
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let err = LinkageTree::new(
            4,
            vec![row(0, 1, 0.5), row(0, 2, 0.7), row(4, 5, 1.0)],
        )
        .unwrap_err();
        assert_eq!(err, InvalidTreeError::DuplicateChild { child: 0 });
    }

    #[test]
    fn test_non_monotonic_heights_rejected() {
        let err = LinkageTree::new(
            4,
            vec![row(0, 1, 1.0), row(2, 3, 0.4), row(4, 5, 2.0)],
        )
        .unwrap_err();
        assert!(matches!(err, InvalidTreeError::NonMonotonicHeight { row: 1, .. }));
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = LinkageTree::new(1, vec![]).unwrap();
        assert_eq!(tree.root_id(), 0);
        assert_eq!(*tree.leaves_under(0).unwrap(), vec![0]);
    }

    #[test]
    fn test_node_label_round_trip() {
        let tree = five_leaf_tree();
        // Root merge (last row) is Node 1.
        assert_eq!(tree.node_label_for_row(3), Some(1));
        assert_eq!(tree.node_label_for_row(0), Some(4));
        assert_eq!(tree.row_for_node_label(1), Some(3));
        assert_eq!(tree.node_id_for_label(1), Some(8));
        assert_eq!(tree.node_id_for_label(4), Some(5));
        assert_eq!(tree.node_id_for_label(5), None);
        assert_eq!(tree.row_for_node_label(0), None);

        for row_index in 0..tree.row_count() {
            let label = tree.node_label_for_row(row_index).unwrap();
            let text = format_node_label(label);
            assert_eq!(parse_node_label(&text), Some(label));
            assert_eq!(tree.row_for_node_label(label), Some(row_index));
        }
    }

    #[test]
    fn test_parse_node_label_rejects_noise() {
        assert_eq!(parse_node_label("Node 12"), Some(12));
        assert_eq!(parse_node_label("  Node 3  "), Some(3));
        assert_eq!(parse_node_label("node 3"), None);
        assert_eq!(parse_node_label("Node"), None);
        assert_eq!(parse_node_label("Cluster 3"), None);
    }
}
