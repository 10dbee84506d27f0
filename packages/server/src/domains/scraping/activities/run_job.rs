//! Scrape job pipeline.
//!
//! config write → worker → result read → webhook, strictly in that order.
//! Every stage failure ends the job; nothing is retried.

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::domains::scraping::errors::JobError;
use crate::domains::scraping::machines::JobState;
use crate::domains::scraping::models::{CallbackPayload, JobConfig, JobRequest};
use crate::domains::scraping::slot::{read_email_list, JobSlot, SlotPolicy};
use crate::kernel::{ServerDeps, WorkerError};

/// A job that reached `CallbackSent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCompletion {
    pub job_id: Uuid,
    pub emails_delivered: usize,
}

/// Run one scrape job end to end.
pub async fn run_scrape_job(
    deps: &ServerDeps,
    slots: &SlotPolicy,
    request: JobRequest,
) -> Result<JobCompletion, JobError> {
    let job_id = Uuid::new_v4();
    let span = info_span!("scrape_job", %job_id, record_id = %request.record_label());

    async move {
        let mut tracker = StateTracker::new();
        info!(
            names = request.name_count(),
            domain = %request.domain,
            niche = %request.niche,
            "Scrape job received"
        );

        let slot = match slots.allocate(job_id).await {
            Ok(slot) => slot,
            Err(e) => {
                let err = JobError::Slot(e);
                tracker.finish(&err);
                return Err(err);
            }
        };

        let result = run_stages(deps, &slot, &request, &mut tracker).await;
        slot.release().await;

        match result {
            Ok(emails_delivered) => Ok(JobCompletion {
                job_id,
                emails_delivered,
            }),
            Err(err) => {
                tracker.finish(&err);
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_stages(
    deps: &ServerDeps,
    slot: &JobSlot,
    request: &JobRequest,
    tracker: &mut StateTracker,
) -> Result<usize, JobError> {
    slot.write_config(&JobConfig::from(request))
        .await
        .map_err(JobError::ConfigWrite)?;
    tracker.advance(JobState::ConfigWritten);

    tracker.advance(JobState::WorkerRunning);
    info!("Starting email scraping process...");
    let outcome = deps.worker.run(slot.dir(), &slot.result_path()).await?;
    if !outcome.success() {
        error!(
            exit_code = ?outcome.exit_code,
            output = %outcome.captured_output,
            "Error during scraping process"
        );
        return Err(WorkerError::Exited {
            code: outcome.exit_code,
        }
        .into());
    }
    tracker.advance(JobState::WorkerSucceeded);

    let emails = read_email_list(&outcome.result_file)
        .await
        .map_err(JobError::ResultFile)?;
    tracker.advance(JobState::ResultRead);
    info!(count = emails.len(), "Read scraped emails");

    let count = emails.len();
    let payload = CallbackPayload {
        record_id: request.record_id.clone(),
        emails,
    };
    let body = serde_json::to_value(&payload).map_err(|e| JobError::Callback(e.into()))?;
    deps.webhook
        .deliver(&request.webhook, &body)
        .await
        .map_err(JobError::Callback)?;
    tracker.advance(JobState::CallbackSent);

    Ok(count)
}

/// Logs state transitions and keeps the job on legal paths.
struct StateTracker {
    state: JobState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: JobState::Received,
        }
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal job transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Job state changed");
        self.state = next;
    }

    fn finish(&mut self, err: &JobError) {
        let next = err.terminal_state();
        error!(from = %self.state, to = %next, error = %err, "Scrape job failed");
        self.state = next;
    }
}
