use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use anyhow::{Context, Result};
use libtricount::{Edge, NodeId, Sign};

/// Lazily parsed `u v t` lines of an insertion-only stream.
pub fn insertion_events(
    path: &Path,
) -> Result<impl Iterator<Item = Result<(NodeId, NodeId, i64)>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open the stream {path:?}"))?;
    Ok(BufReader::new(file).lines().map(|line| {
        let line = line.context("Failed to read the stream")?;
        parse_insertion(&line)
    }))
}

/// Lazily parsed `u v t sign` lines of a fully-dynamic stream.
pub fn dynamic_events(
    path: &Path,
) -> Result<impl Iterator<Item = Result<(NodeId, NodeId, i64, Sign)>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open the stream {path:?}"))?;
    Ok(BufReader::new(file).lines().map(|line| {
        let line = line.context("Failed to read the stream")?;
        parse_dynamic(&line)
    }))
}

/// Reads a `u v heaviness` predictor file into an edge-keyed map.
pub fn read_edge_oracle(path: &Path) -> Result<HashMap<Edge, i32>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open the oracle {path:?}"))?;
    let mut scores = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read the oracle")?;
        let mut fields = line.split_whitespace();
        let u = field(&mut fields, &line)?;
        let v = field(&mut fields, &line)?;
        let h = field(&mut fields, &line)?;
        scores.insert(Edge::new(u, v), h);
    }
    Ok(scores)
}

/// Reads a `node score` predictor file into a node-keyed map.
pub fn read_node_oracle(path: &Path) -> Result<HashMap<NodeId, i32>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open the oracle {path:?}"))?;
    let mut scores = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read the oracle")?;
        let mut fields = line.split_whitespace();
        let node = field(&mut fields, &line)?;
        let score = field(&mut fields, &line)?;
        scores.insert(node, score);
    }
    Ok(scores)
}

fn parse_insertion(line: &str) -> Result<(NodeId, NodeId, i64)> {
    let mut fields = line.split_whitespace();
    let u = field(&mut fields, line)?;
    let v = field(&mut fields, line)?;
    let t = field(&mut fields, line)?;
    Ok((u, v, t))
}

fn parse_dynamic(line: &str) -> Result<(NodeId, NodeId, i64, Sign)> {
    let mut fields = line.split_whitespace();
    let u = field(&mut fields, line)?;
    let v = field(&mut fields, line)?;
    let t = field(&mut fields, line)?;
    let sign = fields
        .next()
        .with_context(|| format!("Missing sign in line {line:?}"))?;
    // Anything that is not an explicit deletion counts as an addition.
    let sign = if sign.starts_with('-') {
        Sign::Delete
    } else {
        Sign::Insert
    };
    Ok((u, v, t, sign))
}

fn field<T>(fields: &mut SplitWhitespace, line: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    fields
        .next()
        .with_context(|| format!("Truncated line {line:?}"))?
        .parse()
        .with_context(|| format!("Malformed line {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_stream_shapes() {
        assert_eq!(parse_insertion("3 9 17").unwrap(), (3, 9, 17));
        assert_eq!(
            parse_dynamic("3 9 17 +").unwrap(),
            (3, 9, 17, Sign::Insert)
        );
        assert_eq!(
            parse_dynamic("9 3 17 -").unwrap(),
            (9, 3, 17, Sign::Delete)
        );
        assert!(parse_insertion("3 9").is_err());
        assert!(parse_insertion("3 x 17").is_err());
        assert!(parse_dynamic("3 9 17").is_err());
    }
}
