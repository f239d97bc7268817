use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use libtricount::{Edge, NodeId};
use log::info;

use crate::stream;

#[derive(Parser, Debug)]
pub struct Opts {
    /// preprocessed `u v t` stream to learn from
    dataset: PathBuf,
    /// kind of predictor to build
    #[arg(long, value_enum, default_value = "exact")]
    kind: OracleKind,
    /// fraction of entries kept, heaviest first
    #[arg(long, default_value_t = 1.0)]
    retain: f64,
    /// arrival window discounted by the no-wr variant; matches the waiting
    /// room size the sampler will run with
    #[arg(long, default_value_t = 0)]
    wr_size: u64,
    /// where to write the predictor
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OracleKind {
    /// true per-edge triangle counts over the whole stream
    Exact,
    /// true counts minus triangles closed inside a trailing arrival window
    NoWr,
    /// node degrees (the min-degree predictor)
    Node,
}

pub fn run(opts: Opts) -> Result<()> {
    match opts.kind {
        OracleKind::Exact => build_edge_oracle(&opts.dataset, opts.retain, None, &opts.output),
        OracleKind::NoWr => build_edge_oracle(
            &opts.dataset,
            opts.retain,
            Some(opts.wr_size),
            &opts.output,
        ),
        OracleKind::Node => build_node_oracle(&opts.dataset, opts.retain, &opts.output),
    }
}

/// Replays the stream exactly and credits every discovered triangle to its
/// two existing edges; the arriving edge starts at its closing count. With
/// `wr_window`, triangles formed within the window are discounted, since the
/// sampler's waiting room would have caught those anyway.
fn build_edge_oracle(
    dataset: &Path,
    retain: f64,
    wr_window: Option<u64>,
    output: &Path,
) -> Result<()> {
    let mut scores: HashMap<Edge, i64> = HashMap::new();
    let mut discount: HashMap<Edge, i64> = HashMap::new();
    let mut arrival: HashMap<Edge, u64> = HashMap::new();
    let mut adj: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    let mut total: i64 = 0;
    let mut n_line = 0u64;

    for event in stream::insertion_events(dataset)? {
        let (u, v, _t) = event?;
        n_line += 1;
        if u == v {
            continue;
        }
        let e = Edge::new(u, v);
        if adj.get(&u).is_some_and(|n| n.contains(&v)) {
            continue;
        }
        if wr_window.is_some() {
            arrival.insert(e, n_line);
        }
        adj.entry(u).or_default().insert(v);
        adj.entry(v).or_default().insert(u);

        let (scan_node, probe_node) = {
            let du = adj[&u].len();
            let dv = adj[&v].len();
            if du <= dv { (u, v) } else { (v, u) }
        };
        let mut closed = 0i64;
        for &w in &adj[&scan_node] {
            if w == probe_node || !adj[&probe_node].contains(&w) {
                continue;
            }
            closed += 1;
            for existing in [Edge::new(scan_node, w), Edge::new(w, probe_node)] {
                *scores.entry(existing).or_insert(0) += 1;
                if let Some(window) = wr_window {
                    if n_line - arrival[&existing] < window {
                        *discount.entry(existing).or_insert(0) += 1;
                    }
                }
            }
        }
        scores.insert(e, closed);
        total += closed;

        if n_line % 3_000_000 == 0 {
            info!("Processed {n_line} edges, counted {total} triangles");
        }
    }

    info!(
        "Full oracle holds {} edges over {total} triangles",
        scores.len()
    );

    let stop = (retain * scores.len() as f64) as usize;
    let mut out = File::create(output)
        .with_context(|| format!("Failed to create the oracle file {output:?}"))?;
    for (edge, heaviness) in scores
        .into_iter()
        .map(|(e, h)| (e, h - discount.get(&e).copied().unwrap_or(0)))
        .sorted_by_key(|&(_, h)| Reverse(h))
        .take(stop)
    {
        let (u, v) = edge.endpoints();
        writeln!(out, "{u} {v} {heaviness}")?;
    }
    Ok(())
}

/// One fast pass to count node degrees; the sampler pairs them with the
/// min-of-endpoints lookup.
fn build_node_oracle(dataset: &Path, retain: f64, output: &Path) -> Result<()> {
    let mut degrees: HashMap<NodeId, i64> = HashMap::new();
    let mut n_line = 0u64;

    for event in stream::insertion_events(dataset)? {
        let (u, v, _t) = event?;
        n_line += 1;
        if u == v {
            continue;
        }
        *degrees.entry(u).or_insert(0) += 1;
        *degrees.entry(v).or_insert(0) += 1;
        if n_line % 3_000_000 == 0 {
            info!("Processed {n_line} edges");
        }
    }

    info!("Degree oracle holds {} nodes", degrees.len());

    let stop = (retain * degrees.len() as f64) as usize;
    let mut out = File::create(output)
        .with_context(|| format!("Failed to create the oracle file {output:?}"))?;
    for (node, degree) in degrees
        .into_iter()
        .sorted_by_key(|&(_, d)| Reverse(d))
        .take(stop)
    {
        writeln!(out, "{node} {degree}")?;
    }
    Ok(())
}
