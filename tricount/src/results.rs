use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// One finished estimation run, as it lands in the results CSV.
pub struct RunSummary<'a> {
    pub algo: &'a str,
    pub alpha: f64,
    pub beta: f64,
    pub oracle_kind: &'a str,
    pub oracle_size: usize,
    pub time_oracle: f64,
    pub memory_budget: usize,
    pub global_count: f64,
    pub time: f64,
}

/// Appends `summary` to `<prefix>_global_count.csv`, header included, so
/// repeated runs accumulate in one file.
pub fn append_global_count(prefix: &Path, summary: &RunSummary) -> Result<()> {
    let path = suffixed(prefix, "_global_count.csv");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open the results file {path:?}"))?;
    writeln!(
        file,
        "Algo,Params,Oracle,SizeOracle,TimeOracle,MemEdges,GlobalTriangleCount,Time"
    )?;
    writeln!(
        file,
        "{},Alpha={}-Beta={},{},{},{:.3},{},{:.6},{:.3}",
        summary.algo,
        summary.alpha,
        summary.beta,
        summary.oracle_kind,
        summary.oracle_size,
        summary.time_oracle,
        summary.memory_budget,
        summary.global_count,
        summary.time,
    )?;
    Ok(())
}

/// Writes `node count` lines to `<prefix>_local_counts.txt`.
pub fn write_local_counts<I>(prefix: &Path, counts: I) -> Result<()>
where
    I: Iterator<Item = (u32, f64)>,
{
    let path = suffixed(prefix, "_local_counts.txt");
    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create the local-counts file {path:?}"))?;
    for (node, count) in counts {
        writeln!(file, "{node} {count:.6}")?;
    }
    Ok(())
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", prefix.display()))
}
