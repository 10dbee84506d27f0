//! External scraping worker as a child process.
//!
//! A worker is started with [`WorkerCommand::start`], which hands back a
//! [`RunningWorker`]. Output arrives as [`OutputChunk`]s in the order the child
//! writes them; [`RunningWorker::wait`] drains the remaining chunks and resolves
//! the exit status. Stdout is accumulated for diagnostics, stderr is only logged.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{info, warn};

const CHUNK_SIZE: usize = 8 * 1024;
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Errors raised while running the worker. A non-zero exit is reported as
/// [`WorkerError::Exited`] by callers that require success.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("worker I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("worker exited with {}", describe_exit(.code))]
    Exited { code: Option<i32> },

    #[error("worker did not exit within {0:?}")]
    TimedOut(Duration),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// How to invoke the worker: program, fixed arguments, optional timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Parse a whitespace separated command line such as `python3 scraper.py`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rewrite relative arguments that name existing files under `base` as
    /// absolute paths. Workers run inside their job directory, so a script
    /// argument like `scraper.py` has to survive the change of directory.
    pub fn resolve_relative_paths(mut self, base: &Path) -> Self {
        for arg in &mut self.args {
            let candidate = Path::new(arg.as_str());
            if candidate.is_relative() && base.join(candidate).is_file() {
                *arg = base.join(candidate).to_string_lossy().into_owned();
            }
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Spawn the worker with `workdir` as its current directory.
    pub fn start(&self, workdir: &Path) -> Result<RunningWorker, WorkerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            forward_output(stdout, OutputStream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(stderr, OutputStream::Stderr, tx);
        }

        let worker = RunningWorker {
            child,
            chunks: rx,
            stdout: Vec::new(),
            timeout: self.timeout,
        };
        info!(program = %self.program, pid = ?worker.id(), "Worker started");

        Ok(worker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Bytes read from one of the worker's output pipes.
#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub bytes: Bytes,
}

/// Result of a finished worker process.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Everything the worker wrote to stdout, in arrival order.
    pub captured_output: String,
    pub result_file: PathBuf,
}

impl WorkerOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Exit status plus captured stdout, before a result file is attached.
#[derive(Debug, Clone)]
pub struct WorkerExit {
    pub exit_code: Option<i32>,
    pub captured_output: String,
}

pub struct RunningWorker {
    child: Child,
    chunks: mpsc::Receiver<OutputChunk>,
    stdout: Vec<u8>,
    timeout: Option<Duration>,
}

impl RunningWorker {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Next chunk of output, or `None` once both pipes are closed.
    pub async fn next_chunk(&mut self) -> Option<OutputChunk> {
        let chunk = self.chunks.recv().await?;
        let text = String::from_utf8_lossy(&chunk.bytes);
        match chunk.stream {
            OutputStream::Stdout => {
                info!(output = %text.trim_end(), "Worker stdout");
                self.stdout.extend_from_slice(&chunk.bytes);
            }
            OutputStream::Stderr => {
                warn!(output = %text.trim_end(), "Worker stderr");
            }
        }
        Some(chunk)
    }

    /// Drain remaining output and wait for the process to exit.
    pub async fn wait(mut self) -> Result<WorkerExit, WorkerError> {
        let Some(limit) = self.timeout else {
            return self.drain().await;
        };

        let result = tokio::time::timeout(limit, self.drain()).await;
        match result {
            Ok(exit) => exit,
            Err(_) => {
                warn!(timeout = ?limit, pid = ?self.id(), "Worker timed out, killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "Failed to kill timed out worker");
                }
                Err(WorkerError::TimedOut(limit))
            }
        }
    }

    async fn drain(&mut self) -> Result<WorkerExit, WorkerError> {
        while self.next_chunk().await.is_some() {}
        let status = self.child.wait().await?;
        info!(exit_code = ?status.code(), "Worker exited");

        Ok(WorkerExit {
            exit_code: status.code(),
            captured_output: String::from_utf8_lossy(&self.stdout).into_owned(),
        })
    }
}

fn forward_output<R>(mut reader: R, stream: OutputStream, tx: mpsc::Sender<OutputChunk>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = OutputChunk {
                        stream,
                        bytes: Bytes::copy_from_slice(&buf[..n]),
                    };
                    if tx.send(chunk).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, ?stream, "Failed to read worker output");
                    break;
                }
            }
        }
    });
}
