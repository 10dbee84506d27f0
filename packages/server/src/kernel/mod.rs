//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;
pub mod webhook;
pub mod worker;

pub use deps::{ProcessWorkerRunner, ServerDeps};
pub use test_dependencies::{MockWebhookClient, MockWorkerRunner, TestDependencies};
pub use traits::*;
pub use webhook::WebhookClient;
pub use worker::{
    OutputChunk, OutputStream, RunningWorker, WorkerCommand, WorkerError, WorkerExit,
    WorkerOutcome,
};
