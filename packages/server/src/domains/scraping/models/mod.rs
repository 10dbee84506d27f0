pub mod job;

pub use job::{parse_email_list, CallbackPayload, JobConfig, JobRequest};
