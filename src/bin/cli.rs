//! Dendrocut CLI - carve a precomputed linkage tree from the command line.
//!
//! Usage: dendrocut-cli [OPTIONS] <COMMAND>
//!
//! Batch driver over the library: load a linkage file, replay split
//! actions, print labels / colors / cluster table. Supports JSON output
//! for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use dendrocut_lib::{
    assign, cluster_count, color_links, convert, linkage::parse_node_label, splits::SplitRegistry,
    summary::summarize_display_clusters, utils, ColorMap, DisplayCluster, LinkageRow, LinkageTree,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Logging Infrastructure
// ============================================================================

use chrono::{Datelike, Local, Timelike};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Initialize logging - creates today's log file under the app data dir.
fn init_logging() -> Option<PathBuf> {
    let log_dir = dirs::data_dir()
        .map(|p| p.join("com.dendrocut.app").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let today = Local::now();
    let log_filename = format!(
        "dendrocut-{:04}-{:02}-{:02}.log",
        today.year(),
        today.month(),
        today.day()
    );
    let log_path = log_dir.join(&log_filename);

    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        *LOG_FILE.lock().unwrap() = Some(file);
        Some(log_path)
    } else {
        None
    }
}

/// Log to both terminal and file
fn log_both(msg: &str) {
    let now = Local::now();
    let timestamp = format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second());

    println!("{}", msg);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{} {}", timestamp, msg);
        }
    }
}

/// Log error to both terminal and file
fn elog_both(msg: &str) {
    let now = Local::now();
    let timestamp = format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second());

    eprintln!("{}", msg);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{} [ERROR] {}", timestamp, msg);
        }
    }
}

// ============================================================================
// CLI definition
// ============================================================================

#[derive(Parser)]
#[command(name = "dendrocut-cli")]
#[command(version, about = "Linkage-tree split-point partitioning CLI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tree statistics for a linkage file
    Show {
        /// Linkage file (JSON, normalized encoding)
        linkage: PathBuf,
    },
    /// Replay split actions and print labels, colors and the cluster table
    Assign {
        /// Linkage file (JSON, normalized encoding)
        linkage: PathBuf,

        /// Split action `NODE:LABEL`, repeatable, applied in order. NODE is
        /// a node id or a renderer label like "Node 4"; omit `:LABEL` to
        /// auto-number.
        #[arg(long = "split", value_name = "SPLIT")]
        splits: Vec<String>,

        /// Remove every split entry for a node (applied after --split)
        #[arg(long = "unsplit", value_name = "NODE")]
        unsplits: Vec<String>,

        /// Use the colorblind-safe palette
        #[arg(long)]
        colorblind: bool,

        /// Write a human-readable dump of the internal tree here
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Convert a matrix between origin and normalized encodings
    Convert {
        /// Input file (JSON)
        input: PathBuf,

        /// Convert a normalized linkage file back to the origin encoding
        #[arg(long)]
        to_origin: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// File formats
// ============================================================================

/// Normalized linkage file: leaf count, merge rows, optional display order.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkageFile {
    leaf_count: usize,
    rows: Vec<LinkageRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<Vec<usize>>,
}

/// Origin-encoding file: merge pairs plus parallel heights and a 1-based
/// display order, the way the upstream statistics tool exports them.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OriginFile {
    merges: Vec<convert::OriginPair>,
    heights: Vec<f64>,
    #[serde(default)]
    order: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput {
    leaf_count: usize,
    row_count: usize,
    max_node_id: usize,
    min_height: f64,
    max_height: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignOutput {
    labels: Vec<i64>,
    cluster_count: usize,
    leaf_colors: Vec<String>,
    edge_colors: Vec<String>,
    color_map: ColorMap,
    display_clusters: Vec<DisplayCluster>,
    split_rows: Vec<usize>,
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    if let Some(log_path) = init_logging() {
        eprintln!("Logging to: {}", log_path.display());
    }

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        elog_both(&format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), String> {
    // Completions need no input file
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "dendrocut-cli", &mut std::io::stdout());
        return Ok(());
    }

    match cli.command {
        Commands::Show { linkage } => cmd_show(&linkage, cli.json),
        Commands::Assign {
            linkage,
            splits,
            unsplits,
            colorblind,
            dump,
        } => cmd_assign(
            &linkage,
            &splits,
            &unsplits,
            colorblind,
            dump.as_deref(),
            cli.json,
            cli.quiet,
        ),
        Commands::Convert { input, to_origin } => cmd_convert(&input, to_origin),
        Commands::Completions { .. } => unreachable!(),
    }
}

fn load_linkage(path: &Path) -> Result<(LinkageTree, Option<Vec<usize>>), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let file: LinkageFile = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;
    let tree = LinkageTree::new(file.leaf_count, file.rows).map_err(|e| e.to_string())?;
    Ok((tree, file.order))
}

fn cmd_show(path: &Path, json: bool) -> Result<(), String> {
    let (tree, _) = load_linkage(path)?;

    let heights: Vec<f64> = tree.rows().iter().map(|r| r.height).collect();
    let output = ShowOutput {
        leaf_count: tree.leaf_count(),
        row_count: tree.row_count(),
        max_node_id: tree.max_node_id(),
        min_height: heights.first().copied().unwrap_or(0.0),
        max_height: heights.last().copied().unwrap_or(0.0),
    };

    if json {
        println!("{}", serde_json::to_string(&output).unwrap_or_default());
    } else {
        log_both(&format!(
            "{} leaves, {} rows, node ids 0..={}, heights {:.4}..{:.4}",
            output.leaf_count,
            output.row_count,
            output.max_node_id,
            output.min_height,
            output.max_height
        ));
    }
    Ok(())
}

fn cmd_assign(
    path: &Path,
    split_args: &[String],
    unsplit_args: &[String],
    colorblind: bool,
    dump: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<(), String> {
    let (tree, order) = load_linkage(path)?;
    let mut registry = SplitRegistry::for_tree(&tree);

    for arg in split_args {
        let (node_id, label) = parse_split_arg(arg, &tree)?;
        let label = label.unwrap_or_else(|| registry.next_label());
        registry.add(node_id, label).map_err(|e| e.to_string())?;
        if !quiet {
            log_both(&format!("[Assign] split node {} as cluster {}", node_id, label));
        }
    }
    for arg in unsplit_args {
        let node_id = parse_node_arg(arg, &tree)?;
        let removed = registry.remove(node_id);
        if !quiet {
            log_both(&format!(
                "[Assign] unsplit node {} ({} entries removed)",
                node_id, removed
            ));
        }
    }

    let labels = assign(&tree, &registry).map_err(|e| e.to_string())?;
    let palette = if colorblind {
        dendrocut_lib::color::COLORBLIND_PALETTE
    } else {
        dendrocut_lib::color::KELLY_MAX_CONTRAST_PALETTE
    };
    let coloring = color_links(&tree, &labels, palette);

    // Cluster table over the rendered left-to-right order when the file
    // carries one, raw leaf order otherwise.
    let display_colors = match &order {
        Some(order) => utils::apply_display_order(&coloring.leaf_colors, order),
        None => coloring.leaf_colors.clone(),
    };
    let display_clusters = summarize_display_clusters(&display_colors);

    if let Some(dump_path) = dump {
        utils::write_debug_dump(dump_path, &tree, &labels, &coloring)
            .map_err(|e| format!("cannot write {}: {}", dump_path.display(), e))?;
        if !quiet {
            log_both(&format!("[Assign] dump written to {}", dump_path.display()));
        }
    }

    let output = AssignOutput {
        cluster_count: cluster_count(&labels),
        split_rows: registry.split_rows(&tree),
        labels,
        leaf_colors: coloring.leaf_colors,
        edge_colors: coloring.edge_colors,
        color_map: coloring.color_map,
        display_clusters,
    };

    if json {
        println!("{}", serde_json::to_string(&output).unwrap_or_default());
    } else {
        log_both(&format!("Number of clusters: {}", output.cluster_count));
        log_both("cluster  size  share  color");
        for c in &output.display_clusters {
            log_both(&format!(
                "{:<8} {:<5} {:<6.2} {}",
                c.cluster_id, c.size, c.share, c.color
            ));
        }
    }
    Ok(())
}

fn cmd_convert(path: &Path, to_origin: bool) -> Result<(), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    if to_origin {
        let file: LinkageFile = serde_json::from_str(&content)
            .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;
        let pairs: Vec<(usize, usize)> = file.rows.iter().map(|r| (r.left, r.right)).collect();
        let output = OriginFile {
            merges: convert::normalized_to_origin(&pairs),
            heights: file.rows.iter().map(|r| r.height).collect(),
            order: Vec::new(),
        };
        println!("{}", serde_json::to_string(&output).unwrap_or_default());
    } else {
        let file: OriginFile = serde_json::from_str(&content)
            .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;
        let pairs = convert::origin_to_normalized(&file.merges);
        let zero_based = convert::order_from_one_based(&file.order);
        let order_values: Vec<f64> = zero_based.iter().map(|&x| x as f64).collect();
        let rows = convert::assemble_rows(&pairs, &file.heights, &order_values);
        let output = LinkageFile {
            leaf_count: file.merges.len() + 1,
            rows,
            order: if zero_based.is_empty() {
                None
            } else {
                Some(zero_based)
            },
        };
        println!("{}", serde_json::to_string(&output).unwrap_or_default());
    }
    Ok(())
}

/// Parse `NODE:LABEL` (label optional). NODE is a numeric node id or a
/// renderer hover label like "Node 4".
fn parse_split_arg(arg: &str, tree: &LinkageTree) -> Result<(usize, Option<i64>), String> {
    match arg.rsplit_once(':') {
        Some((node, label)) => {
            let label: i64 = label
                .trim()
                .parse()
                .map_err(|_| format!("invalid cluster label in '{}'", arg))?;
            Ok((parse_node_arg(node, tree)?, Some(label)))
        }
        None => Ok((parse_node_arg(arg, tree)?, None)),
    }
}

fn parse_node_arg(arg: &str, tree: &LinkageTree) -> Result<usize, String> {
    let arg = arg.trim();
    if let Some(label) = parse_node_label(arg) {
        return tree
            .node_id_for_label(label)
            .ok_or_else(|| format!("'{}' does not name a merge row", arg));
    }
    arg.parse()
        .map_err(|_| format!("invalid node '{}' (expected an id or \"Node k\")", arg))
}
