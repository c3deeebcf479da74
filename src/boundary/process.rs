use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::boundary::error::BoundaryError;
use crate::boundary::harness::NODE_HARNESS;
use crate::boundary::runner::{BoundaryBackend, BoundaryHandle, Generation};
use crate::boundary::stream::JsonlStreamParser;
use crate::synth::SynthesizedDocument;

/// Environment variable carrying the generation into the runtime
pub const GENERATION_ENV: &str = "LIVEPREVIEW_GENERATION";

/// Command that hosts a document: reads it on stdin, writes JSONL on stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl RuntimeCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// `node -e <harness>`, with `node` resolved on PATH when possible
    pub fn node_harness() -> Self {
        let program = which::which("node").unwrap_or_else(|_| PathBuf::from("node"));
        Self::new(program).with_args(vec!["-e".into(), NODE_HARNESS.into()])
    }
}

impl Default for RuntimeCommand {
    fn default() -> Self {
        Self::node_harness()
    }
}

/// Boundary backed by one child process per load
pub struct ProcessBoundary {
    command: RuntimeCommand,
}

impl ProcessBoundary {
    pub fn new(command: RuntimeCommand) -> Self {
        Self { command }
    }

    fn build_command(&self, generation: Generation) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args);
        cmd.envs(&self.command.env);
        cmd.env(GENERATION_ENV, generation.value().to_string());

        // Document in on stdin, wire protocol out on stdout
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd
    }
}

impl Default for ProcessBoundary {
    fn default() -> Self {
        Self::new(RuntimeCommand::default())
    }
}

#[async_trait]
impl BoundaryBackend for ProcessBoundary {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn load(
        &self,
        document: &SynthesizedDocument,
        generation: Generation,
    ) -> Result<BoundaryHandle, BoundaryError> {
        let mut cmd = self.build_command(generation);
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BoundaryError::RuntimeNotFound(self.command.program.display().to_string())
            } else {
                BoundaryError::Io(e)
            }
        })?;

        let pid = child.id();
        let mut stdin = child.stdin.take().ok_or(BoundaryError::StdinCaptureFailed)?;
        let stdout = child.stdout.take().ok_or(BoundaryError::StdoutCaptureFailed)?;
        let stderr = child.stderr.take();

        tracing::debug!(%generation, ?pid, program = %self.command.program.display(), "Boundary process spawned");

        // Feed the document, then close stdin so the runtime sees EOF
        let payload = document.as_str().to_owned();
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                tracing::debug!(%generation, "Failed to write document to runtime: {e}");
            }
            let _ = stdin.shutdown().await;
        });

        let (tx, rx) = mpsc::channel::<serde_json::Value>(256);
        tokio::spawn(async move {
            if let Err(e) = JsonlStreamParser::parse_stream(stdout, tx).await {
                tracing::debug!(%generation, "Runtime stdout closed with error: {e}");
            }
        });

        if let Some(stderr) = stderr {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(%generation, "runtime stderr: {line}");
                }
            });
        }

        // Monitor exit; a fired or dropped kill switch tears the process down
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let killed = tokio::select! {
                status = child.wait() => {
                    tracing::debug!(%generation, ?status, "Boundary process exited");
                    false
                }
                _ = kill_rx => true,
            };
            if killed {
                match child.kill().await {
                    Ok(()) => tracing::debug!(%generation, "Boundary process killed"),
                    Err(e) => tracing::debug!(%generation, "Failed to kill boundary process: {e}"),
                }
            }
        });

        Ok(BoundaryHandle::new(generation, rx, pid).with_kill_switch(kill_tx))
    }

    fn is_available(&self) -> bool {
        self.command.program.exists() || which::which(&self.command.program).is_ok()
    }
}
