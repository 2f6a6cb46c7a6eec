//! Top memory consumers
//!
//! Process ranking comes from the system `top` utility and names from `ps`. Both are invoked once per listing, no
//! matter how many processes are requested:
//!
//! ```text
//! top -l 1 -o mem -n 5 -stats pid,mem
//! ps -p 0,123,456 -o pid=,comm=
//! ```
//!
//! The rank order reported by `top` is kept as-is through name resolution.

mod command;
pub mod parse;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub use command::{CommandRunner, SystemCommandRunner};
pub use parse::{parse_memory_string, parse_process_names, parse_ranking};

/// Display name used for pid 0, which has no regular process-table entry
pub const KERNEL_TASK_NAME: &str = "kernel_task";

/// A process and its resident memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMemory {
    pub pid: u32,
    pub name: String,
    pub bytes: u64,
}

impl ProcessMemory {
    pub fn new(pid: u32, name: impl Into<String>, bytes: u64) -> Self {
        Self { pid, name: name.into(), bytes }
    }
}

/// Source of the processes using the most memory
#[async_trait]
pub trait ProcessSource: Send + Sync {
    /// Returns at most `count` processes ordered by resident memory, highest first
    async fn top_processes(&self, count: usize) -> Result<Vec<ProcessMemory>>;
}

/// [`ProcessSource`] backed by `top` and `ps`
#[derive(Debug, Clone)]
pub struct TopProcessLister<R = SystemCommandRunner> {
    runner: R,
}

impl TopProcessLister<SystemCommandRunner> {
    /// Creates a lister whose external invocations are bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self::with_runner(SystemCommandRunner::new(timeout))
    }
}

impl<R: CommandRunner> TopProcessLister<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    async fn rank(&self, count: usize) -> Result<Vec<(u32, u64)>> {
        let count_arg = count.to_string();
        let args = ["-l", "1", "-o", "mem", "-n", count_arg.as_str(), "-stats", "pid,mem"]
            .iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>();
        let output = self.runner.run("top", &args).await?;
        if output.trim().is_empty() {
            return Err(Error::external_tool("top produced no output"));
        }

        let mut ranking = parse_ranking(&output)?;
        ranking.truncate(count);
        Ok(ranking)
    }

    async fn resolve_names(&self, pids: &[u32]) -> Result<HashMap<u32, String>> {
        let lookup = pids.iter().filter(|pid| **pid != 0).map(u32::to_string).collect::<Vec<_>>();
        if lookup.is_empty() {
            return Ok(Default::default());
        }

        let args = vec!["-p".to_string(), lookup.join(","), "-o".to_string(), "pid=,comm=".to_string()];
        // empty output means every pid exited after `top` ran; the join names them by pid
        let output = self.runner.run("ps", &args).await?;
        Ok(parse_process_names(&output))
    }
}

#[async_trait]
impl<R: CommandRunner> ProcessSource for TopProcessLister<R> {
    async fn top_processes(&self, count: usize) -> Result<Vec<ProcessMemory>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let ranking = self.rank(count).await?;
        let pids = ranking.iter().map(|(pid, _)| *pid).collect::<Vec<_>>();
        let names = self.resolve_names(&pids).await?;

        let processes = join_names(&ranking, &names);
        debug!(count = processes.len(), "resolved top processes");
        Ok(processes)
    }
}

/// Attaches display names to a ranking without reordering it
pub fn join_names(ranking: &[(u32, u64)], names: &HashMap<u32, String>) -> Vec<ProcessMemory> {
    ranking
        .iter()
        .map(|&(pid, bytes)| {
            let name = if pid == 0 {
                KERNEL_TASK_NAME.to_string()
            } else {
                names.get(&pid).cloned().unwrap_or_else(|| format!("pid {}", pid))
            };
            ProcessMemory { pid, name, bytes }
        })
        .collect()
}
