use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libtricount::{Edge, NodeId, Sign};
use log::info;

use crate::stream;

#[derive(Parser, Debug)]
pub struct Opts {
    /// preprocessed stream to count over
    dataset: PathBuf,
    /// treat the stream as fully dynamic (`u v t sign` lines)
    #[arg(long)]
    fully_dynamic: bool,
    /// where to write the ground-truth summary
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(opts: Opts) -> Result<()> {
    let total = if opts.fully_dynamic {
        exact_dynamic(&opts.dataset, &opts.output)?
    } else {
        exact_insertion(&opts.dataset, &opts.output)?
    };
    info!("Exact count finished, T = {total}");
    Ok(())
}

/// Counts triangles of an insertion-only stream by merging each arriving
/// edge into an in-memory adjacency and counting the common neighbours of
/// its endpoints. Self-loops and duplicates are skipped.
fn exact_insertion(dataset: &Path, output: &Path) -> Result<i64> {
    let mut adj: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    let mut total: i64 = 0;
    let mut n_line = 0u64;

    for event in stream::insertion_events(dataset)? {
        let (u, v, _t) = event?;
        n_line += 1;
        if u == v || adj.get(&u).is_some_and(|n| n.contains(&v)) {
            continue;
        }
        total += common_neighbors(&adj, u, v) as i64;
        adj.entry(u).or_default().insert(v);
        adj.entry(v).or_default().insert(u);
        if n_line % 3_000_000 == 0 {
            info!("Processed {n_line} edges, counted {total} triangles");
        }
    }

    let mut out = File::create(output)
        .with_context(|| format!("Failed to create the summary file {output:?}"))?;
    writeln!(out, "Ground Truth:")?;
    writeln!(out, "Nodes = {}", adj.len())?;
    writeln!(out, "Edges = {n_line}")?;
    writeln!(out, "Triangles = {total}")?;
    Ok(total)
}

/// Counts triangles of a fully-dynamic stream: each event adds or subtracts
/// the wedges it closes against the current graph. Also tracks the summary
/// statistics of the stream (unique nodes and edges, the high-water mark of
/// live edges).
fn exact_dynamic(dataset: &Path, output: &Path) -> Result<i64> {
    let mut adj: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    let mut unique_nodes: HashSet<NodeId> = HashSet::new();
    let mut unique_edges: HashSet<Edge> = HashSet::new();
    let mut total: i64 = 0;
    let mut live_edges: i64 = 0;
    let mut max_edges: i64 = 0;
    let mut time_max_edges = 0u64;
    let mut n_line = 0u64;

    for event in stream::dynamic_events(dataset)? {
        let (u, v, _t, sign) = event?;
        if u == v {
            continue;
        }
        unique_nodes.insert(u);
        unique_nodes.insert(v);
        unique_edges.insert(Edge::new(u, v));

        let closed = common_neighbors(&adj, u, v) as i64;
        let present = adj.get(&u).is_some_and(|n| n.contains(&v));
        match sign {
            Sign::Insert => {
                total += closed;
                if !present {
                    live_edges += 1;
                    adj.entry(u).or_default().insert(v);
                    adj.entry(v).or_default().insert(u);
                }
            }
            Sign::Delete => {
                total -= closed;
                if present {
                    live_edges -= 1;
                    remove_edge(&mut adj, u, v);
                }
            }
        }

        if live_edges > max_edges {
            max_edges = live_edges;
            time_max_edges = n_line;
        }
        n_line += 1;
        if n_line % 3_000_000 == 0 {
            info!("Processed {n_line} events, live edges {live_edges}, counted {total}");
        }
    }

    let mut out = File::create(output)
        .with_context(|| format!("Failed to create the summary file {output:?}"))?;
    writeln!(out, "Ground Truth:")?;
    writeln!(out, "Number of Unique Nodes = {}", unique_nodes.len())?;
    writeln!(out, "Number of Nodes at the end = {}", adj.len())?;
    writeln!(out, "Number of Events = {n_line}")?;
    writeln!(
        out,
        "Maximum Number of Edges = {max_edges} at time {time_max_edges} in the stream"
    )?;
    writeln!(out, "Number of Edges at the end = {live_edges}")?;
    writeln!(out, "Number of Unique Edges = {}", unique_edges.len())?;
    writeln!(out, "Triangles = {total}")?;
    Ok(total)
}

fn common_neighbors(adj: &HashMap<NodeId, HashSet<NodeId>>, u: NodeId, v: NodeId) -> usize {
    let (Some(u_neighs), Some(v_neighs)) = (adj.get(&u), adj.get(&v)) else {
        return 0;
    };
    let (small, big) = if u_neighs.len() <= v_neighs.len() {
        (u_neighs, v_neighs)
    } else {
        (v_neighs, u_neighs)
    };
    small.iter().filter(|w| big.contains(w)).count()
}

fn remove_edge(adj: &mut HashMap<NodeId, HashSet<NodeId>>, u: NodeId, v: NodeId) {
    if let Some(neighs) = adj.get_mut(&u) {
        neighs.remove(&v);
        if neighs.is_empty() {
            adj.remove(&u);
        }
    }
    if let Some(neighs) = adj.get_mut(&v) {
        neighs.remove(&u);
        if neighs.is_empty() {
            adj.remove(&v);
        }
    }
}
