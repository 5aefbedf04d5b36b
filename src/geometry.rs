//! Geometry repair for degenerate leaf-tick positions.
//!
//! When three or more observations are identical, their merges happen at
//! height exactly zero and the rendered segment endpoints put extra points
//! on the baseline. The leaf ticks extracted from "x positions at height 0"
//! then outnumber the actual leaves and the axis labels drift. The repair
//! respaces the ticks evenly over the observed span.
//!
//! This is an approximate heuristic: it restores the tick count and
//! spacing, not a verified left-to-right leaf identity for duplicate-heavy
//! inputs.

/// Distinct x positions whose paired y is exactly 0, in first-appearance
/// order. Inputs are the flattened segment endpoints of a rendered tree.
pub fn zero_height_positions(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let mut zero_vals: Vec<f64> = Vec::new();
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if y == 0.0 && !zero_vals.contains(&x) {
            zero_vals.push(x);
        }
    }
    zero_vals
}

/// More baseline positions than leaves means the raw positions are
/// untrustworthy.
pub fn is_degenerate(zero_vals: &[f64], leaf_count: usize) -> bool {
    zero_vals.len() > leaf_count
}

/// Exactly `leaf_count` evenly spaced positions spanning `[min, max]`.
pub fn repair_leaf_positions(min: f64, max: f64, leaf_count: usize) -> Vec<f64> {
    match leaf_count {
        0 => Vec::new(),
        1 => vec![min],
        n => {
            let step = (max - min) / (n - 1) as f64;
            (0..n).map(|i| min + step * i as f64).collect()
        }
    }
}

/// Leaf tick positions for rendering: collect the baseline positions,
/// respace them when degenerate, and return them sorted.
pub fn normalize_leaf_positions(xs: &[f64], ys: &[f64], leaf_count: usize) -> Vec<f64> {
    let mut zero_vals = zero_height_positions(xs, ys);

    if is_degenerate(&zero_vals, leaf_count) {
        let min = zero_vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = zero_vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        zero_vals = repair_leaf_positions(min, max, leaf_count);
    }

    zero_vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    zero_vals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_height_positions_dedupes_in_order() {
        let xs = vec![5.0, 15.0, 5.0, 25.0, 15.0];
        let ys = vec![0.0, 0.0, 0.0, 0.0, 1.5];
        assert_eq!(zero_height_positions(&xs, &ys), vec![5.0, 15.0, 25.0]);
    }

    #[test]
    fn test_healthy_positions_pass_through() {
        // 3 leaves, 3 baseline ticks: nothing to repair.
        let xs = vec![15.0, 5.0, 25.0];
        let ys = vec![0.0, 0.0, 0.0];
        assert_eq!(normalize_leaf_positions(&xs, &ys, 3), vec![5.0, 15.0, 25.0]);
    }

    #[test]
    fn test_degenerate_positions_are_respaced() {
        // 5 identical observations produce 6 distinct baseline positions
        // in [0, 10]; repair yields exactly 5, evenly spaced across the
        // same span.
        let xs = vec![0.0, 2.0, 4.0, 5.0, 8.0, 10.0];
        let ys = vec![0.0; 6];
        let repaired = normalize_leaf_positions(&xs, &ys, 5);
        assert_eq!(repaired, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_repair_single_leaf() {
        assert_eq!(repair_leaf_positions(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(repair_leaf_positions(3.0, 9.0, 0), Vec::<f64>::new());
    }
}
