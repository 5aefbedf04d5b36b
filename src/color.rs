//! Color coding - map cluster labels to colors and push them up the tree.
//!
//! Leaves take their cluster's palette color; a merge edge takes its
//! children's color while they agree and turns gray at the first point two
//! differently colored subtrees meet. Rows are processed once in stored
//! ascending-height order, so every child is resolved before its parent.

use std::collections::HashMap;

use serde::Serialize;

use crate::linkage::LinkageTree;

/// Color of unclustered structure and of every edge above a divergence.
pub const DEFAULT_GRAY: &str = "#808080";

/// Kelly's colors of maximum contrast, minus white (invisible on the
/// default canvas). Index 0 doubles as the baseline "unsplit" color.
pub const KELLY_MAX_CONTRAST_PALETTE: &[&str] = &[
    "#222222", "#f3c300", "#875692", "#f38400", "#a1caf1", "#be0032", "#c2b280",
    "#848482", "#008856", "#e68fac", "#0067a5", "#f99379", "#604e97", "#f6a600",
    "#b3446c", "#dcd300", "#882d17", "#8db600", "#654522", "#e25822", "#2b3d26",
];

/// Okabe-Ito colorblind-safe palette.
pub const COLORBLIND_PALETTE: &[&str] = &[
    "#000000", "#e69f00", "#56b4e9", "#009e73", "#f0e442", "#0072b2", "#d55e00",
    "#cc79a7",
];

/// Cyclic palette lookup. Never fails: any label, however large or
/// negative, wraps with a non-negative modulo.
pub fn palette_color<'a>(palette: &[&'a str], label: i64) -> &'a str {
    if palette.is_empty() {
        return DEFAULT_GRAY;
    }
    let index = label.rem_euclid(palette.len() as i64) as usize;
    palette[index]
}

/// Label -> color for every label present in an assignment. Lookups are
/// render-facing and must never fail, so unknown labels fall back to gray.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorMap {
    colors: HashMap<i64, String>,
}

impl ColorMap {
    pub fn from_labels(labels: &[i64], palette: &[&str]) -> Self {
        let mut colors = HashMap::new();
        for &label in labels {
            colors
                .entry(label)
                .or_insert_with(|| palette_color(palette, label).to_string());
        }
        Self { colors }
    }

    pub fn color_for(&self, label: i64) -> &str {
        self.colors.get(&label).map(String::as_str).unwrap_or(DEFAULT_GRAY)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &str)> {
        self.colors.iter().map(|(label, color)| (label, color.as_str()))
    }
}

/// Full coloring of a tree under one assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkColoring {
    /// One color per leaf index.
    pub leaf_colors: Vec<String>,
    /// One color per linkage row, in stored row order.
    pub edge_colors: Vec<String>,
    pub color_map: ColorMap,
}

/// Color every leaf and merge edge for the given per-leaf labels.
pub fn color_links(tree: &LinkageTree, labels: &[i64], palette: &[&str]) -> LinkColoring {
    let color_map = ColorMap::from_labels(labels, palette);

    let leaf_colors: Vec<String> = labels
        .iter()
        .map(|&label| palette_color(palette, label).to_string())
        .collect();

    let mut edge_colors: Vec<String> = Vec::with_capacity(tree.row_count());
    for row in tree.rows() {
        let left = child_color(tree, &leaf_colors, &edge_colors, row.left);
        let right = child_color(tree, &leaf_colors, &edge_colors, row.right);
        let color = if left == right {
            left.to_string()
        } else {
            DEFAULT_GRAY.to_string()
        };
        edge_colors.push(color);
    }

    LinkColoring {
        leaf_colors,
        edge_colors,
        color_map,
    }
}

/// Color a child resolves to: its leaf color below n, otherwise the edge
/// color its row already received. Missing entries read as gray rather
/// than failing the render.
fn child_color<'a>(
    tree: &LinkageTree,
    leaf_colors: &'a [String],
    edge_colors: &'a [String],
    child: usize,
) -> &'a str {
    let slot = if child < tree.leaf_count() {
        leaf_colors.get(child)
    } else {
        edge_colors.get(child - tree.leaf_count())
    };
    slot.map(String::as_str).unwrap_or(DEFAULT_GRAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::assign;
    use crate::linkage::tests::five_leaf_tree;
    use crate::splits::SplitRegistry;

    #[test]
    fn test_palette_color_wraps_both_directions() {
        let palette = &["#aa0000", "#00bb00", "#0000cc"];
        assert_eq!(palette_color(palette, 0), "#aa0000");
        assert_eq!(palette_color(palette, 4), "#00bb00");
        assert_eq!(palette_color(palette, -1), "#0000cc");
        assert_eq!(palette_color(palette, -3), "#aa0000");
        assert_eq!(palette_color(palette, i64::MAX), palette[(i64::MAX % 3) as usize]);
    }

    #[test]
    fn test_palette_color_empty_palette_is_gray() {
        assert_eq!(palette_color(&[], 5), DEFAULT_GRAY);
    }

    #[test]
    fn test_color_map_unknown_label_is_gray() {
        let map = ColorMap::from_labels(&[0, 1], KELLY_MAX_CONTRAST_PALETTE);
        assert_eq!(map.color_for(0), KELLY_MAX_CONTRAST_PALETTE[0]);
        assert_eq!(map.color_for(99), DEFAULT_GRAY);
    }

    #[test]
    fn test_uniform_tree_is_uniformly_colored() {
        let tree = five_leaf_tree();
        let registry = SplitRegistry::for_tree(&tree);
        let labels = assign(&tree, &registry).unwrap();
        let coloring = color_links(&tree, &labels, KELLY_MAX_CONTRAST_PALETTE);

        let baseline = KELLY_MAX_CONTRAST_PALETTE[0];
        assert!(coloring.leaf_colors.iter().all(|c| c == baseline));
        assert!(coloring.edge_colors.iter().all(|c| c == baseline));
    }

    #[test]
    fn test_edges_gray_above_divergence() {
        // Split node 5 ({0,1}) into cluster 1: rows 0 and 1 stay uniform,
        // rows 2 and 3 merge differently colored subtrees and turn gray.
        let tree = five_leaf_tree();
        let mut registry = SplitRegistry::for_tree(&tree);
        registry.add(5, 1).unwrap();
        let labels = assign(&tree, &registry).unwrap();
        let coloring = color_links(&tree, &labels, KELLY_MAX_CONTRAST_PALETTE);

        let baseline = KELLY_MAX_CONTRAST_PALETTE[0];
        let cluster = KELLY_MAX_CONTRAST_PALETTE[1];
        assert_eq!(coloring.leaf_colors, vec![cluster, cluster, baseline, baseline, baseline]);
        assert_eq!(coloring.edge_colors, vec![cluster, baseline, DEFAULT_GRAY, DEFAULT_GRAY]);
    }

    #[test]
    fn test_edge_color_matches_leaves_beneath() {
        // Color coherence: a row is non-gray iff every leaf beneath it
        // resolved to the same color.
        let tree = five_leaf_tree();
        let mut registry = SplitRegistry::for_tree(&tree);
        registry.add(7, 1).unwrap();
        registry.add(5, 2).unwrap();
        let labels = assign(&tree, &registry).unwrap();
        let coloring = color_links(&tree, &labels, KELLY_MAX_CONTRAST_PALETTE);

        for (row_index, _) in tree.rows().iter().enumerate() {
            let node_id = tree.leaf_count() + row_index;
            let leaves = tree.leaves_under(node_id).unwrap();
            let colors: Vec<&str> = leaves
                .iter()
                .map(|&leaf| coloring.leaf_colors[leaf].as_str())
                .collect();
            let uniform = colors.windows(2).all(|w| w[0] == w[1]);
            if uniform {
                assert_eq!(coloring.edge_colors[row_index], colors[0]);
            } else {
                assert_eq!(coloring.edge_colors[row_index], DEFAULT_GRAY);
            }
        }
    }
}
