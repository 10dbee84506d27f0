//! Scraping domain activities - entry-point business logic
//!
//! Called from the HTTP routes. Activities take the raw request and return the
//! final outcome.

pub mod run_job;

pub use run_job::{run_scrape_job, JobCompletion};
