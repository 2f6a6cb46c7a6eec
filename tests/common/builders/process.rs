use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use darwin_memwatch::process::{CommandRunner, TopProcessLister};
use darwin_memwatch::{Error, Result};

/// Builder for a `top`/`ps` pair with canned output
pub struct TestProcessBuilder {
    rows: Vec<(u32, String, String)>,
    top_fails: bool,
}

impl TestProcessBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new(), top_fails: false }
    }

    /// Adds a ranked row; `mem` is written to the `top` output verbatim (e.g. "1.5G", "812M+")
    pub fn process(mut self, pid: u32, command: &str, mem: &str) -> Self {
        self.rows.push((pid, command.to_string(), mem.to_string()));
        self
    }

    pub fn top_fails(mut self) -> Self {
        self.top_fails = true;
        self
    }

    pub fn top_output(&self) -> String {
        let mut output = String::from(
            "Processes: 498 total, 2 running, 496 sleeping, 2411 threads\n\
             PhysMem: 15G used (2805M wired, 1204M compressor), 340M unused.\n\n\
             PID    MEM\n",
        );
        for (pid, _, mem) in &self.rows {
            output.push_str(&format!("{:<6} {}\n", pid, mem));
        }
        output
    }

    pub fn ps_output(&self) -> String {
        self.rows
            .iter()
            .filter(|(pid, _, _)| *pid != 0)
            .map(|(pid, command, _)| format!("{:>5} {}\n", pid, command))
            .collect()
    }

    pub fn build(self) -> (TopProcessLister<ScriptedCommands>, ScriptedCommands) {
        let commands = ScriptedCommands {
            top: if self.top_fails { None } else { Some(self.top_output()) },
            ps: self.ps_output(),
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        (TopProcessLister::with_runner(commands.clone()), commands)
    }
}

impl Default for TestProcessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Command runner replaying canned `top` and `ps` output
#[derive(Clone)]
pub struct ScriptedCommands {
    top: Option<String>,
    ps: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCommands {
    /// Programs invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommands {
    async fn run(&self, program: &str, _args: &[String]) -> Result<String> {
        self.calls.lock().push(program.to_string());
        match program {
            "top" => self.top.clone().ok_or_else(|| Error::ExternalToolFailure("top timed out".to_string())),
            "ps" => Ok(self.ps.clone()),
            other => Err(Error::ExternalToolFailure(format!("unexpected program {}", other))),
        }
    }
}
