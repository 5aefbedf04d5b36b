//! Cluster summary table over the rendered display order.
//!
//! A display cluster is a maximal contiguous run of one color in the
//! left-to-right order the dendrogram is drawn in. The same color showing
//! up again further right is a separate display cluster - the table
//! reports what the user sees, not the label partition.

use serde::Serialize;

/// One contiguous same-color run in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayCluster {
    /// First-appearance rank along the display sequence.
    pub cluster_id: usize,
    pub size: usize,
    /// size / total leaves, rounded to 2 decimals.
    pub share: f64,
    pub color: String,
}

/// Group display-ordered leaf colors into contiguous runs.
pub fn summarize_display_clusters<S: AsRef<str>>(display_colors: &[S]) -> Vec<DisplayCluster> {
    let total = display_colors.len();
    let mut clusters: Vec<DisplayCluster> = Vec::new();

    for color in display_colors {
        let color = color.as_ref();
        match clusters.last_mut() {
            Some(run) if run.color == color => run.size += 1,
            _ => clusters.push(DisplayCluster {
                cluster_id: clusters.len(),
                size: 1,
                share: 0.0,
                color: color.to_string(),
            }),
        }
    }

    for run in &mut clusters {
        run.share = round2(run.size as f64 / total as f64);
    }

    clusters
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
