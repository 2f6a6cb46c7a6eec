use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Runs an external utility and returns its standard output
///
/// Empty output is not an error here; callers decide whether it is usable.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// [`CommandRunner`] that spawns real processes with a bounded run time
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| Error::external_tool(format!("{} timed out after {:?}", program, self.timeout)))?
            .map_err(|e| Error::external_tool(format!("failed to launch {}: {}", program, e)))?;

        // `ps -p` exits non-zero when some pids have exited but still prints the rest,
        // so the exit status alone is not treated as a failure.
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::external_tool(format!("{} produced non UTF-8 output", program)))?;

        if stdout.trim().is_empty() {
            debug!(program, status = %output.status, "command produced no output");
        }

        Ok(stdout)
    }
}
