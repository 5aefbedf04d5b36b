//! Interactive split-point partitioning of hierarchical clustering trees.
//!
//! The crate consumes a precomputed agglomerative merge history and lets a
//! caller carve it into labeled clusters by registering split points, then
//! derives everything a renderer needs: per-leaf labels, leaf and edge
//! colors, repaired leaf-tick positions, and a per-cluster summary table.
//!
//! Flow: merge matrix -> [`linkage::LinkageTree`]; user actions ->
//! [`splits::SplitRegistry`]; both -> [`assign::assign`] -> label array ->
//! [`color::color_links`] -> colors -> [`summary::summarize_display_clusters`].
//! [`geometry`] repairs degenerate leaf positions independently of coloring.

pub mod assign;
pub mod color;
pub mod convert;
pub mod geometry;
pub mod linkage;
pub mod splits;
pub mod summary;
pub mod utils;

pub use assign::{assign, cluster_count};
pub use color::{color_links, ColorMap, LinkColoring, DEFAULT_GRAY};
pub use linkage::{InvalidTreeError, LinkageRow, LinkageTree, OutOfRangeNodeError};
pub use splits::{SplitPoint, SplitRegistry};
pub use summary::{summarize_display_clusters, DisplayCluster};
