//! Scraping domain: one HTTP request becomes one external worker run and one
//! webhook delivery.

pub mod activities;
pub mod errors;
pub mod machines;
pub mod models;
pub mod slot;

pub use activities::{run_scrape_job, JobCompletion};
pub use errors::JobError;
pub use machines::{
    JobState, CALLBACK_FAILED_MESSAGE, GENERIC_ERROR_MESSAGE, RESULT_READ_FAILED_MESSAGE,
    SUCCESS_MESSAGE, WORKER_FAILED_MESSAGE,
};
pub use models::{parse_email_list, CallbackPayload, JobConfig, JobRequest};
pub use slot::{read_email_list, JobSlot, SlotPolicy, CONFIG_FILE_NAME, RESULT_FILE_NAME};
