//! Shared helpers: display-order permutation and the debug dump.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::color::LinkColoring;
use crate::linkage::{format_node_label, LinkageTree};

/// Reorder a per-leaf slice into display order. `order` lists leaf indices
/// left to right as the dendrogram draws them; out-of-range indices are
/// skipped rather than failing the render.
pub fn apply_display_order<T: Clone>(values: &[T], order: &[usize]) -> Vec<T> {
    order
        .iter()
        .filter_map(|&index| values.get(index).cloned())
        .collect()
}

/// Write a human-readable dump of the internal tree representation.
///
/// Write-only debugging aid: nothing parses this back, the format may
/// change freely.
pub fn write_debug_dump(
    path: &Path,
    tree: &LinkageTree,
    labels: &[i64],
    coloring: &LinkColoring,
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(
        out,
        "linkage tree: {} leaves, {} rows",
        tree.leaf_count(),
        tree.row_count()
    )?;
    writeln!(out)?;
    writeln!(out, "row   node  label     left  right  height      edge color")?;
    for (i, row) in tree.rows().iter().enumerate() {
        let label = tree
            .node_label_for_row(i)
            .map(format_node_label)
            .unwrap_or_default();
        let edge_color = coloring
            .edge_colors
            .get(i)
            .map(String::as_str)
            .unwrap_or("-");
        writeln!(
            out,
            "{:<5} {:<5} {:<9} {:<5} {:<6} {:<11.4} {}",
            i,
            tree.leaf_count() + i,
            label,
            row.left,
            row.right,
            row.height,
            edge_color
        )?;
    }

    writeln!(out)?;
    writeln!(out, "leaf  cluster  color")?;
    for (leaf, &label) in labels.iter().enumerate() {
        let color = coloring
            .leaf_colors
            .get(leaf)
            .map(String::as_str)
            .unwrap_or("-");
        writeln!(out, "{:<5} {:<8} {}", leaf, label, color)?;
    }

    out.flush()
}
