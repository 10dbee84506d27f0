// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The scrape job pipeline lives in domains/scraping and talks to the outside
// world only through these seams.
//
// Naming convention: Base* for trait names (e.g., BaseWorkerRunner)

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use super::worker::{WorkerError, WorkerOutcome};

// =============================================================================
// Worker Runner Trait (Infrastructure - external scraping process)
// =============================================================================

#[async_trait]
pub trait BaseWorkerRunner: Send + Sync {
    /// Run the worker to completion inside `workdir`.
    ///
    /// `result_file` is where the worker is expected to leave its output; it is
    /// carried on the outcome but not read here. A non-zero exit is returned as
    /// an `Ok` outcome so callers can log the captured output.
    async fn run(&self, workdir: &Path, result_file: &Path) -> Result<WorkerOutcome, WorkerError>;
}

// =============================================================================
// Webhook Client Trait (Infrastructure - outbound callbacks)
// =============================================================================

#[async_trait]
pub trait BaseWebhookClient: Send + Sync {
    /// POST a JSON body to `url`. Any non-2xx response is an error.
    async fn deliver(&self, url: &str, body: &serde_json::Value) -> Result<()>;
}
