//! Scrape job state machine.
//!
//! Pure and synchronous: states, legal transitions, and the one HTTP response
//! each terminal state produces.
//!
//! ```text
//! Received → ConfigWritten → WorkerRunning → WorkerSucceeded → ResultRead → CallbackSent
//!                                          ↘ WorkerFailed    ↘ ResultReadFailed ↘ CallbackFailed
//! ```
//!
//! `Aborted` covers failures outside the staged flow (job directory or config
//! write errors, panics).

use std::fmt;

use axum::http::StatusCode;

pub const SUCCESS_MESSAGE: &str = "Emails scraped and webhook sent";
pub const WORKER_FAILED_MESSAGE: &str = "Error during scraping process";
pub const RESULT_READ_FAILED_MESSAGE: &str = "Error reading emails";
pub const CALLBACK_FAILED_MESSAGE: &str = "Error sending webhook";
pub const GENERIC_ERROR_MESSAGE: &str = "Something broke!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Received,
    ConfigWritten,
    WorkerRunning,
    WorkerSucceeded,
    WorkerFailed,
    ResultRead,
    ResultReadFailed,
    CallbackSent,
    CallbackFailed,
    Aborted,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Received => "received",
            JobState::ConfigWritten => "config_written",
            JobState::WorkerRunning => "worker_running",
            JobState::WorkerSucceeded => "worker_succeeded",
            JobState::WorkerFailed => "worker_failed",
            JobState::ResultRead => "result_read",
            JobState::ResultReadFailed => "result_read_failed",
            JobState::CallbackSent => "callback_sent",
            JobState::CallbackFailed => "callback_failed",
            JobState::Aborted => "aborted",
        }
    }

    /// Whether `self → next` is a legal step.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, ConfigWritten)
                | (ConfigWritten, WorkerRunning)
                | (WorkerRunning, WorkerSucceeded)
                | (WorkerRunning, WorkerFailed)
                | (WorkerSucceeded, ResultRead)
                | (WorkerSucceeded, ResultReadFailed)
                | (ResultRead, CallbackSent)
                | (ResultRead, CallbackFailed)
        ) || (!self.is_terminal() && next == Aborted)
    }

    pub fn is_terminal(&self) -> bool {
        self.response().is_some()
    }

    /// Status and body for a terminal state, `None` while the job is in flight.
    pub fn response(&self) -> Option<(StatusCode, &'static str)> {
        match self {
            JobState::CallbackSent => Some((StatusCode::OK, SUCCESS_MESSAGE)),
            JobState::WorkerFailed => {
                Some((StatusCode::INTERNAL_SERVER_ERROR, WORKER_FAILED_MESSAGE))
            }
            JobState::ResultReadFailed => {
                Some((StatusCode::INTERNAL_SERVER_ERROR, RESULT_READ_FAILED_MESSAGE))
            }
            JobState::CallbackFailed => {
                Some((StatusCode::INTERNAL_SERVER_ERROR, CALLBACK_FAILED_MESSAGE))
            }
            JobState::Aborted => Some((StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE)),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
