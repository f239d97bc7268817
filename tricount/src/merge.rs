use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libtricount::{Edge, Sign};
use log::info;
use rand::Rng;

#[derive(Parser, Debug)]
pub struct Opts {
    /// directory of snapshot files, merged in filename order
    folder: PathBuf,
    /// number of snapshots to merge
    #[arg(long)]
    snapshots: usize,
    /// column delimiter of the snapshot files
    #[arg(long, default_value = " ")]
    delimiter: String,
    /// header lines to skip in each snapshot
    #[arg(long, default_value_t = 0)]
    skip: usize,
    /// where to write the fully-dynamic stream
    #[arg(short, long)]
    output: PathBuf,
}

/// Turns a sequence of graph snapshots into one signed stream: the first
/// snapshot inserts everything; each later snapshot inserts the edges it
/// gained and deletes the edges it lost, the deletions landing at uniformly
/// random timestamps within the snapshot's interval.
pub fn run(opts: Opts) -> Result<()> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(&opts.folder)
        .with_context(|| format!("Failed to list the snapshot folder {:?}", opts.folder))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();

    let delimiter = opts.delimiter.chars().next().unwrap_or(' ');
    let mut rng = rand::rng();
    let mut events: Vec<(Edge, i64, Sign)> = Vec::new();
    let mut live: HashMap<Edge, i64> = HashMap::new();
    let mut current_timestamp: i64 = 0;

    for (idx, file) in files.iter().take(opts.snapshots).enumerate() {
        info!("Processing snapshot #{}: {file:?}", idx + 1);
        let (snapshot, max_t) = read_snapshot(file, delimiter, opts.skip)?;

        if idx == 0 {
            for (&edge, &t) in &snapshot {
                events.push((edge, t, Sign::Insert));
            }
            live.extend(snapshot);
            current_timestamp = max_t;
        } else {
            let added: Vec<(Edge, i64)> = snapshot
                .iter()
                .filter(|(edge, _)| !live.contains_key(edge))
                .map(|(&edge, &t)| (edge, t))
                .collect();
            let deleted: Vec<Edge> = live
                .keys()
                .filter(|edge| !snapshot.contains_key(edge))
                .copied()
                .collect();
            info!(
                "Snapshot #{}: {} edges added, {} deleted",
                idx + 1,
                added.len(),
                deleted.len()
            );

            for (edge, t) in added {
                let timestamp = current_timestamp + t;
                events.push((edge, timestamp, Sign::Insert));
                live.insert(edge, timestamp);
            }
            let upper = current_timestamp + max_t.max(1);
            for edge in deleted {
                let timestamp = rng.random_range(current_timestamp + 1..=upper);
                events.push((edge, timestamp, Sign::Delete));
                live.remove(&edge);
            }
            current_timestamp += max_t;
        }
    }

    info!("Fully-dynamic stream holds {} events", events.len());

    events.sort_by_key(|&(_, t, _)| t);
    let mut out = File::create(&opts.output)
        .with_context(|| format!("Failed to create the output {:?}", opts.output))?;
    for (edge, t, sign) in events {
        let (u, v) = edge.endpoints();
        let sign = match sign {
            Sign::Insert => '+',
            Sign::Delete => '-',
        };
        writeln!(out, "{u} {v} {t} {sign}")?;
    }
    Ok(())
}

/// Reads one snapshot: self-loops dropped, duplicate edges collapsed onto
/// the running arrival counter. Returns the edges with their arrival times
/// and the final counter value.
fn read_snapshot(path: &Path, delimiter: char, skip: usize) -> Result<(HashMap<Edge, i64>, i64)> {
    let file =
        File::open(path).with_context(|| format!("Failed to open the snapshot {path:?}"))?;
    let mut edges: HashMap<Edge, i64> = HashMap::new();
    let mut t: i64 = 0;

    for (n_line, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read the snapshot")?;
        if n_line < skip {
            continue;
        }
        let mut fields: Box<dyn Iterator<Item = &str> + '_> = if delimiter == ' ' {
            Box::new(line.split_whitespace())
        } else {
            Box::new(line.split(delimiter))
        };
        let u: u32 = fields
            .next()
            .with_context(|| format!("Truncated line {line:?}"))?
            .trim()
            .parse()
            .with_context(|| format!("Malformed line {line:?}"))?;
        let v: u32 = fields
            .next()
            .with_context(|| format!("Truncated line {line:?}"))?
            .trim()
            .parse()
            .with_context(|| format!("Malformed line {line:?}"))?;
        if u == v {
            continue;
        }
        let edge = Edge::new(u, v);
        if edges.insert(edge, t).is_none() {
            t += 1;
        }
    }
    Ok((edges, t))
}
