//! Server dependencies for the scrape pipeline (using traits for testability)
//!
//! Production wiring uses [`ProcessWorkerRunner`] and [`WebhookClient`];
//! tests swap in the mocks from `test_dependencies`.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::kernel::{
    BaseWebhookClient, BaseWorkerRunner, WebhookClient, WorkerCommand, WorkerError, WorkerOutcome,
};

// =============================================================================
// ProcessWorkerRunner (implements BaseWorkerRunner trait)
// =============================================================================

/// Runs the configured worker command as a child process.
pub struct ProcessWorkerRunner {
    command: WorkerCommand,
}

impl ProcessWorkerRunner {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl BaseWorkerRunner for ProcessWorkerRunner {
    async fn run(&self, workdir: &Path, result_file: &Path) -> Result<WorkerOutcome, WorkerError> {
        let exit = self.command.start(workdir)?.wait().await?;
        Ok(WorkerOutcome {
            exit_code: exit.exit_code,
            captured_output: exit.captured_output,
            result_file: result_file.to_path_buf(),
        })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies shared by every scrape job
#[derive(Clone)]
pub struct ServerDeps {
    pub worker: Arc<dyn BaseWorkerRunner>,
    pub webhook: Arc<dyn BaseWebhookClient>,
}

impl ServerDeps {
    pub fn new(worker: Arc<dyn BaseWorkerRunner>, webhook: Arc<dyn BaseWebhookClient>) -> Self {
        Self { worker, webhook }
    }

    /// Production dependencies: a real child process and a reqwest webhook client.
    pub fn production(command: WorkerCommand, webhook: WebhookClient) -> Self {
        Self::new(
            Arc::new(ProcessWorkerRunner::new(command)),
            Arc::new(webhook),
        )
    }
}
