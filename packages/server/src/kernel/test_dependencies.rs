// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{BaseWebhookClient, BaseWorkerRunner, ServerDeps, WorkerError, WorkerOutcome};

// =============================================================================
// Mock Worker Runner
// =============================================================================

/// Arguments captured from a worker run
#[derive(Debug, Clone)]
pub struct WorkerCall {
    pub workdir: PathBuf,
    pub result_file: PathBuf,
    /// Contents of `config.json` in the workdir at the moment the worker started
    pub config: Option<String>,
}

#[derive(Debug, Clone)]
enum WorkerBehavior {
    Exit {
        code: Option<i32>,
        stdout: String,
        result: Option<String>,
    },
    TimedOut,
}

pub struct MockWorkerRunner {
    behavior: WorkerBehavior,
    calls: Arc<Mutex<Vec<WorkerCall>>>,
}

impl MockWorkerRunner {
    /// A worker that exits 0 and writes `result` to the result file
    pub fn succeeding(result: &str) -> Self {
        Self::with_behavior(WorkerBehavior::Exit {
            code: Some(0),
            stdout: String::new(),
            result: Some(result.to_string()),
        })
    }

    /// A worker that exits 0 without producing a result file
    pub fn succeeding_without_result() -> Self {
        Self::with_behavior(WorkerBehavior::Exit {
            code: Some(0),
            stdout: String::new(),
            result: None,
        })
    }

    /// A worker that exits with `code` after printing `stdout`
    pub fn failing(code: i32, stdout: &str) -> Self {
        Self::with_behavior(WorkerBehavior::Exit {
            code: Some(code),
            stdout: stdout.to_string(),
            result: None,
        })
    }

    /// A worker killed by a signal (no exit code)
    pub fn killed() -> Self {
        Self::with_behavior(WorkerBehavior::Exit {
            code: None,
            stdout: String::new(),
            result: None,
        })
    }

    /// A worker that never finishes within its timeout
    pub fn timing_out() -> Self {
        Self::with_behavior(WorkerBehavior::TimedOut)
    }

    fn with_behavior(behavior: WorkerBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all recorded worker runs
    pub fn calls(&self) -> Vec<WorkerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseWorkerRunner for MockWorkerRunner {
    async fn run(&self, workdir: &Path, result_file: &Path) -> Result<WorkerOutcome, WorkerError> {
        let config = tokio::fs::read_to_string(workdir.join("config.json"))
            .await
            .ok();
        self.calls.lock().unwrap().push(WorkerCall {
            workdir: workdir.to_path_buf(),
            result_file: result_file.to_path_buf(),
            config,
        });

        match &self.behavior {
            WorkerBehavior::Exit {
                code,
                stdout,
                result,
            } => {
                if let Some(content) = result {
                    tokio::fs::write(result_file, content).await?;
                }
                Ok(WorkerOutcome {
                    exit_code: *code,
                    captured_output: stdout.clone(),
                    result_file: result_file.to_path_buf(),
                })
            }
            WorkerBehavior::TimedOut => Err(WorkerError::TimedOut(
                std::time::Duration::from_secs(1),
            )),
        }
    }
}

// =============================================================================
// Mock Webhook Client
// =============================================================================

pub struct MockWebhookClient {
    fail_with: Option<String>,
    deliveries: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockWebhookClient {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every delivery fail with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Get all (url, body) pairs that were delivered or attempted
    pub fn deliveries(&self) -> Vec<(String, serde_json::Value)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn was_called(&self) -> bool {
        !self.deliveries.lock().unwrap().is_empty()
    }
}

impl Default for MockWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseWebhookClient for MockWebhookClient {
    async fn deliver(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));

        match &self.fail_with {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub worker: Arc<MockWorkerRunner>,
    pub webhook: Arc<MockWebhookClient>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            worker: Arc::new(MockWorkerRunner::succeeding("")),
            webhook: Arc::new(MockWebhookClient::new()),
        }
    }

    /// Set a mock worker
    pub fn mock_worker(mut self, worker: MockWorkerRunner) -> Self {
        self.worker = Arc::new(worker);
        self
    }

    /// Set a mock webhook client
    pub fn mock_webhook(mut self, webhook: MockWebhookClient) -> Self {
        self.webhook = Arc::new(webhook);
        self
    }

    /// Convert into ServerDeps, keeping handles to the mocks for assertions
    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(self.worker.clone(), self.webhook.clone())
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
