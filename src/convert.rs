//! Conversion between the two linkage matrix encodings.
//!
//! Origin convention (as produced by the upstream statistics tool): a leaf
//! appears as the negative number -(leaf_id + 1); an internal node as a
//! 1-based positive id. Normalized convention (everything downstream):
//! leaves 0..n-1, internal nodes n..2n-2. The conversion is element-wise
//! and bit-exact in both directions.

use serde::{Deserialize, Serialize};

use crate::linkage::LinkageRow;

/// One merge row in the origin encoding, children only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginPair {
    pub left: i64,
    pub right: i64,
}

/// Origin child ids -> normalized child ids.
pub fn origin_to_normalized(pairs: &[OriginPair]) -> Vec<(usize, usize)> {
    let row_count = pairs.len();
    pairs
        .iter()
        .map(|p| {
            (
                origin_child_to_normalized(p.left, row_count),
                origin_child_to_normalized(p.right, row_count),
            )
        })
        .collect()
}

/// Normalized child ids -> origin child ids. Inverse of
/// [`origin_to_normalized`] for matrices of the same row count.
pub fn normalized_to_origin(pairs: &[(usize, usize)]) -> Vec<OriginPair> {
    let row_count = pairs.len();
    pairs
        .iter()
        .map(|&(left, right)| OriginPair {
            left: normalized_child_to_origin(left, row_count),
            right: normalized_child_to_origin(right, row_count),
        })
        .collect()
}

fn origin_child_to_normalized(el: i64, row_count: usize) -> usize {
    if el < 0 {
        (-el - 1) as usize
    } else {
        el as usize + row_count
    }
}

fn normalized_child_to_origin(id: usize, row_count: usize) -> i64 {
    // Leaves occupy 0..=row_count (n = row_count + 1).
    if id <= row_count {
        -(id as i64 + 1)
    } else {
        (id - row_count) as i64
    }
}

/// Shift a 1-based display-order sequence to 0-based leaf indices.
pub fn order_from_one_based(raw: &[i64]) -> Vec<usize> {
    raw.iter().map(|&x| (x - 1).max(0) as usize).collect()
}

/// Zip converted merge pairs with their heights and display-order values
/// into linkage rows. Rows beyond the shortest input are dropped; the
/// tree constructor catches a resulting row-count mismatch.
pub fn assemble_rows(pairs: &[(usize, usize)], heights: &[f64], order: &[f64]) -> Vec<LinkageRow> {
    pairs
        .iter()
        .zip(heights.iter())
        .enumerate()
        .map(|(i, (&(left, right), &height))| LinkageRow {
            left,
            right,
            height,
            order_index: order.get(i).copied().unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::LinkageTree;

    #[test]
    fn test_round_trip_full_four_leaf_matrix() {
        // Full 4-leaf history: two leaf pairs, then their merges joined.
        let origin = vec![
            OriginPair { left: -1, right: -2 },
            OriginPair { left: -3, right: -4 },
            OriginPair { left: 1, right: 2 },
        ];

        let normalized = origin_to_normalized(&origin);
        assert_eq!(normalized, vec![(0, 1), (2, 3), (4, 5)]);

        let back = normalized_to_origin(&normalized);
        assert_eq!(back, origin);
    }

    #[test]
    fn test_round_trip_mixed_row() {
        // A merge joining a leaf with an earlier internal node.
        let origin = vec![
            OriginPair { left: -1, right: -2 },
            OriginPair { left: -3, right: 1 },
        ];
        let normalized = origin_to_normalized(&origin);
        assert_eq!(normalized, vec![(0, 1), (2, 3)]);
        assert_eq!(normalized_to_origin(&normalized), origin);
    }

    #[test]
    fn test_order_from_one_based() {
        assert_eq!(order_from_one_based(&[3, 1, 2]), vec![2, 0, 1]);
    }

    #[test]
    fn test_assembled_rows_build_a_valid_tree() {
        let origin = vec![
            OriginPair { left: -1, right: -2 },
            OriginPair { left: -3, right: -4 },
            OriginPair { left: 1, right: 2 },
        ];
        let pairs = origin_to_normalized(&origin);
        let rows = assemble_rows(&pairs, &[0.4, 0.9, 1.6], &[1.0, 3.0, 0.0]);
        assert_eq!(rows[2].height, 1.6);
        assert_eq!(rows[1].order_index, 3.0);

        let tree = LinkageTree::new(4, rows).unwrap();
        let mut leaves: Vec<usize> = tree.leaves_under(tree.root_id()).unwrap().to_vec();
        leaves.sort();
        assert_eq!(leaves, vec![0, 1, 2, 3]);
    }
}
