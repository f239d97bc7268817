use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use libtricount::Edge;
use log::info;

#[derive(Parser, Debug)]
pub struct Opts {
    /// raw edge list to normalize
    dataset: PathBuf,
    /// column delimiter of the raw file
    #[arg(long, default_value = " ")]
    delimiter: String,
    /// header lines to skip
    #[arg(long, default_value_t = 0)]
    skip: usize,
    /// where to write the `u v t` stream
    #[arg(short, long)]
    output: PathBuf,
}

/// Normalizes a raw edge list: drops self-loops, collapses duplicate edges
/// onto their latest arrival, orders by arrival, and rescales timestamps to
/// the arrival rank.
pub fn run(opts: Opts) -> Result<()> {
    let file = File::open(&opts.dataset)
        .with_context(|| format!("Failed to open the dataset {:?}", opts.dataset))?;
    let delimiter = opts.delimiter.chars().next().unwrap_or(' ');

    let mut arrivals: HashMap<Edge, u64> = HashMap::new();
    let mut t = 0u64;
    for (n_line, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read the dataset")?;
        if n_line < opts.skip {
            continue;
        }
        let (u, v) = parse_endpoints(&line, delimiter)?;
        if u == v {
            continue;
        }
        t += 1;
        // A repeated edge keeps one entry with its latest arrival.
        arrivals.insert(Edge::new(u, v), t);

        if (n_line + 1) % 3_000_000 == 0 {
            info!("Processed {} lines", n_line + 1);
        }
    }

    info!("Preprocessed {} distinct edges from {t} arrivals", arrivals.len());

    let mut out = File::create(&opts.output)
        .with_context(|| format!("Failed to create the output {:?}", opts.output))?;
    for (rank, (edge, _)) in arrivals
        .into_iter()
        .sorted_by_key(|&(_, arrival)| arrival)
        .enumerate()
    {
        let (u, v) = edge.endpoints();
        writeln!(out, "{u} {v} {}", rank + 1)?;
    }
    Ok(())
}

fn parse_endpoints(line: &str, delimiter: char) -> Result<(u32, u32)> {
    let mut fields: Box<dyn Iterator<Item = &str> + '_> = if delimiter == ' ' {
        Box::new(line.split_whitespace())
    } else {
        Box::new(line.split(delimiter))
    };
    let u = fields
        .next()
        .with_context(|| format!("Truncated line {line:?}"))?
        .trim()
        .parse()
        .with_context(|| format!("Malformed line {line:?}"))?;
    let v = fields
        .next()
        .with_context(|| format!("Truncated line {line:?}"))?
        .trim()
        .parse()
        .with_context(|| format!("Malformed line {line:?}"))?;
    Ok((u, v))
}
