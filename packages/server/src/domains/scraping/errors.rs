use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::machines::JobState;
use crate::kernel::WorkerError;

/// Why a scrape job stopped short of delivering its callback.
///
/// Each variant ends the job in exactly one terminal [`JobState`], which owns
/// the status and body sent to the caller. Error details stay in the logs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to prepare job directory: {0}")]
    Slot(#[source] io::Error),

    #[error("Failed to write job config: {0}")]
    ConfigWrite(#[source] io::Error),

    #[error("Scraping worker failed: {0}")]
    Worker(#[from] WorkerError),

    #[error("Failed to read result file: {0}")]
    ResultFile(#[source] io::Error),

    #[error("Webhook delivery failed: {0:#}")]
    Callback(anyhow::Error),

    #[error("Job task failed: {0}")]
    Internal(String),
}

impl JobError {
    pub fn terminal_state(&self) -> JobState {
        match self {
            JobError::Worker(_) => JobState::WorkerFailed,
            JobError::ResultFile(_) => JobState::ResultReadFailed,
            JobError::Callback(_) => JobState::CallbackFailed,
            JobError::Slot(_) | JobError::ConfigWrite(_) | JobError::Internal(_) => {
                JobState::Aborted
            }
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let (status, body) = self
            .terminal_state()
            .response()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, super::GENERIC_ERROR_MESSAGE));
        (status, body).into_response()
    }
}
