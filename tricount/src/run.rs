use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use libtricount::{DynamicSampler, InsertionSampler};
use log::info;

use crate::results::{self, RunSummary};
use crate::stream;

#[derive(Parser, Debug)]
pub struct Opts {
    /// preprocessed stream to estimate over
    dataset: PathBuf,
    /// treat the stream as fully dynamic (`u v t sign` lines)
    #[arg(long)]
    fully_dynamic: bool,
    /// seed for the sampler's random generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// memory budget: the number of edges the sampler may retain
    #[arg(short = 'k', long)]
    memory_budget: usize,
    /// fraction of the budget spent on the waiting room
    #[arg(long)]
    alpha: f64,
    /// fraction of the remaining budget spent on the heavy set
    #[arg(long)]
    beta: f64,
    /// heaviness predictor file
    #[arg(long)]
    oracle: Option<PathBuf>,
    /// shape of the predictor file
    #[arg(long, value_enum, default_value = "edges")]
    oracle_type: OracleType,
    /// prefix for the result files
    #[arg(short, long, default_value = "tricount")]
    output: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OracleType {
    /// `u v heaviness` lines
    Edges,
    /// `node score` lines
    Nodes,
}

enum Loaded {
    Edges(std::collections::HashMap<libtricount::Edge, i32>),
    Nodes(std::collections::HashMap<libtricount::NodeId, i32>),
    None,
}

impl Loaded {
    fn len(&self) -> usize {
        match self {
            Loaded::Edges(scores) => scores.len(),
            Loaded::Nodes(scores) => scores.len(),
            Loaded::None => 0,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Loaded::Edges(_) => "Edges",
            Loaded::Nodes(_) => "Nodes",
            Loaded::None => "None",
        }
    }
}

pub fn run(opts: Opts) -> Result<()> {
    let oracle_start = Instant::now();
    let oracle = match (&opts.oracle, opts.oracle_type) {
        (Some(path), OracleType::Edges) => Loaded::Edges(stream::read_edge_oracle(path)?),
        (Some(path), OracleType::Nodes) => Loaded::Nodes(stream::read_node_oracle(path)?),
        (None, _) => Loaded::None,
    };
    let time_oracle = oracle_start.elapsed().as_secs_f64();
    if !matches!(oracle, Loaded::None) {
        info!(
            "Read a {} oracle with {} entries in {time_oracle:.3}s",
            oracle.kind(),
            oracle.len()
        );
    }

    let (algo, global, time) = if opts.fully_dynamic {
        run_dynamic(&opts, &oracle)?
    } else {
        run_insertion(&opts, &oracle)?
    };

    info!("{algo} run finished in {time:.3}s, estimated T = {global}");
    results::append_global_count(
        &opts.output,
        &RunSummary {
            algo,
            alpha: opts.alpha,
            beta: opts.beta,
            oracle_kind: oracle.kind(),
            oracle_size: oracle.len(),
            time_oracle,
            memory_budget: opts.memory_budget,
            global_count: global,
            time,
        },
    )?;
    Ok(())
}

fn run_insertion(opts: &Opts, oracle: &Loaded) -> Result<(&'static str, f64, f64)> {
    let mut sampler =
        InsertionSampler::new(opts.seed, opts.memory_budget, opts.alpha, opts.beta)
            .context("Bad sampler configuration")?;
    match oracle {
        Loaded::Edges(scores) => sampler.set_edge_oracle(scores.clone()),
        Loaded::Nodes(scores) => sampler.set_node_oracle(scores.clone()),
        Loaded::None => {}
    }

    let start = Instant::now();
    let mut n_line = 0u64;
    for event in stream::insertion_events(&opts.dataset)? {
        let (u, v, _t) = event?;
        if u == v {
            bail!("Self-loop ({u}, {v}) in the stream; run `tricount preprocess` first");
        }
        sampler.process_edge(u, v);
        n_line += 1;
        if n_line % 5_000_000 == 0 {
            info!(
                "Processed {n_line} edges, estimated T = {}",
                sampler.global_triangles()
            );
        }
    }
    let time = start.elapsed().as_secs_f64();

    results::write_local_counts(&opts.output, sampler.local_counts())?;
    Ok(("insertion", sampler.global_triangles(), time))
}

fn run_dynamic(opts: &Opts, oracle: &Loaded) -> Result<(&'static str, f64, f64)> {
    let mut sampler = DynamicSampler::new(opts.seed, opts.memory_budget, opts.alpha, opts.beta)
        .context("Bad sampler configuration")?;
    match oracle {
        Loaded::Edges(scores) => sampler.set_edge_oracle(scores.clone()),
        Loaded::Nodes(scores) => sampler.set_node_oracle(scores.clone()),
        Loaded::None => {}
    }

    let start = Instant::now();
    let mut n_line = 0u64;
    for event in stream::dynamic_events(&opts.dataset)? {
        let (u, v, t, sign) = event?;
        if u == v {
            bail!("Self-loop ({u}, {v}) in the stream; run `tricount preprocess` first");
        }
        sampler.process_edge(u, v, t, sign);
        n_line += 1;
        if n_line % 5_000_000 == 0 {
            info!(
                "Processed {n_line} events, estimated T = {}",
                sampler.global_triangles()
            );
        }
    }
    let time = start.elapsed().as_secs_f64();
    Ok(("fully-dynamic", sampler.global_triangles(), time))
}
