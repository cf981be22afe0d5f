//! Process execution service for the external toolchain.
//!
//! Spawns opaque commands, streams their output into the log and reports the
//! exit code. The exit code is the only contract honored with the child.

use crate::error::{ProcessError, ProcessResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Output stream a captured line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Finished process: exit code plus captured output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `-1` when terminated by a signal
    pub exit_code: i32,
    /// Lines written to stdout
    pub stdout: Vec<String>,
    /// Lines written to stderr
    pub stderr: Vec<String>,
}

impl ProcessOutcome {
    /// Outcome with an exit code and no output
    pub fn with_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few stderr lines (stdout when stderr is empty), for error messages
    pub fn tail(&self, lines: usize) -> String {
        let source = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let start = source.len().saturating_sub(lines);
        source[start..].join("\n")
    }
}

/// Capability to run an external command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `working_dir` and wait for it to exit
    async fn execute(
        &self,
        program: &str,
        working_dir: Option<&Path>,
        args: &[String],
    ) -> ProcessResult<ProcessOutcome>;
}

/// Runs commands as tokio child processes
///
/// Children are killed if the awaiting future is dropped.
#[derive(Debug, Clone, Default)]
pub struct ProcessService;

impl ProcessService {
    /// Create a new process service
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessService {
    async fn execute(
        &self,
        program: &str,
        working_dir: Option<&Path>,
        args: &[String],
    ) -> ProcessResult<ProcessOutcome> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        tracing::info!(program, args = %args.join(" "), "Starting process");
        let start = Instant::now();

        let mut child = command.spawn().map_err(|source| ProcessError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::join!(
            collect_lines(stdout, program, OutputStream::Stdout),
            collect_lines(stderr, program, OutputStream::Stderr),
            child.wait(),
        );
        let status = status?;

        let outcome = ProcessOutcome {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout?,
            stderr: stderr?,
        };

        tracing::info!(
            program,
            exit_code = outcome.exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Process exited"
        );

        Ok(outcome)
    }
}

/// Read a child stream to the end, forwarding each line to the log
async fn collect_lines<R>(
    reader: Option<R>,
    program: &str,
    stream: OutputStream,
) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };

    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    while let Some(line) = lines.next_line().await? {
        match stream {
            OutputStream::Stdout => tracing::debug!(program, "[OUT] {}", line),
            OutputStream::Stderr => tracing::debug!(program, "[ERR] {}", line),
        }
        collected.push(line);
    }
    Ok(collected)
}

/// Build an owned argument vector from string slices
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
