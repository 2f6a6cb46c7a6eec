//! Parsers for `top` and `ps` output.
//!
//! Every function here is total: malformed lines are skipped and logged, never turned into a panic.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Converts a compact memory string such as `"512M"` or `"1.2G+"` into bytes
///
/// Returns 0 when no number can be read; callers treat zero as "drop this entry".
pub fn parse_memory_string(raw: &str) -> u64 {
    let numeric: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let value = match numeric.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => return 0,
    };

    let multiplier = match raw.chars().rev().find(|c| c.is_ascii_alphabetic()) {
        Some('G') | Some('g') => GIB,
        Some('M') | Some('m') => MIB,
        Some('K') | Some('k') => KIB,
        Some('B') | Some('b') | None => 1.0,
        Some(_) => return 0,
    };

    (value * multiplier).round() as u64
}

/// Extracts `(pid, bytes)` pairs from `top -stats pid,mem` output, in output order
///
/// Fails only when no header line with both a `PID` and a `MEM` column is present.
pub fn parse_ranking(output: &str) -> Result<Vec<(u32, u64)>> {
    let mut lines = output.lines();

    lines
        .by_ref()
        .find(|line| is_ranking_header(line))
        .ok_or_else(|| Error::parse_anomaly("top output has no PID/MEM header"))?;

    let mut ranking = Vec::new();
    for line in lines {
        let mut fields = line.split_whitespace();
        let (pid, mem) = match (fields.next(), fields.next()) {
            (Some(pid), Some(mem)) => (pid, mem),
            (None, _) => continue,
            _ => {
                debug!(line, "skipping short top line");
                continue;
            },
        };

        let Ok(pid) = pid.parse::<u32>() else {
            debug!(line, "skipping top line with non-numeric pid");
            continue;
        };

        let bytes = parse_memory_string(mem);
        if bytes == 0 {
            debug!(line, "skipping top line with unreadable memory value");
            continue;
        }

        ranking.push((pid, bytes));
    }

    Ok(ranking)
}

fn is_ranking_header(line: &str) -> bool {
    let mut has_pid = false;
    let mut has_mem = false;
    for token in line.split_whitespace() {
        match token {
            "PID" => has_pid = true,
            "MEM" => has_mem = true,
            _ => {},
        }
    }
    has_pid && has_mem
}

/// Maps pid to display name from `ps -o pid=,comm=` output
///
/// The display name is the last path component of the command, so `/Applications/Safari.app/Contents/MacOS/Safari`
/// becomes `Safari`.
pub fn parse_process_names(output: &str) -> HashMap<u32, String> {
    let mut names = HashMap::new();

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let Some(pid) = fields.next().and_then(|pid| pid.parse::<u32>().ok()) else {
            if !line.trim().is_empty() {
                debug!(line, "skipping ps line without pid");
            }
            continue;
        };

        let path = fields.collect::<Vec<_>>().join(" ");
        let path = path.trim();
        if path.is_empty() {
            debug!(line, "skipping ps line without command");
            continue;
        }

        let name = path.rsplit('/').find(|part| !part.is_empty()).unwrap_or(path);
        names.insert(pid, name.to_string());
    }

    names
}
