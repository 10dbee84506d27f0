use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domains::scraping::SlotPolicy;
use crate::kernel::WorkerCommand;

/// Default request body limit (100 MB), large name lists are expected.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024 * 1024;

/// Default cap on how much of a request body is written to the log.
pub const DEFAULT_BODY_LOG_PREFIX_BYTES: usize = 1_000_000;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub worker: WorkerCommand,
    pub slot_policy: SlotPolicy,
    pub webhook_timeout: Option<Duration>,
    pub body_limit_bytes: usize,
    pub body_log_prefix_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let worker_timeout = optional_secs("WORKER_TIMEOUT_SECS")?;
        let worker = WorkerCommand::parse(
            &env::var("WORKER_COMMAND").unwrap_or_else(|_| "python3 scraper.py".to_string()),
        )
        .context("WORKER_COMMAND must name a program")?
        .with_timeout(worker_timeout)
        .resolve_relative_paths(&env::current_dir().context("Failed to read current directory")?);

        let slot_policy = match env::var("JOB_ISOLATION")
            .unwrap_or_else(|_| "per-job".to_string())
            .as_str()
        {
            "per-job" => SlotPolicy::PerJob {
                root: PathBuf::from(env::var("JOBS_DIR").unwrap_or_else(|_| "jobs".to_string())),
                keep: parse_bool("KEEP_JOB_DIRS")?,
            },
            "shared" => SlotPolicy::Shared {
                dir: PathBuf::from(
                    env::var("SHARED_SLOT_DIR").unwrap_or_else(|_| ".".to_string()),
                ),
            },
            other => bail!("JOB_ISOLATION must be 'per-job' or 'shared', got '{}'", other),
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            worker,
            slot_policy,
            webhook_timeout: optional_secs("WEBHOOK_TIMEOUT_SECS")?,
            body_limit_bytes: env::var("BODY_LIMIT_BYTES")
                .map(|v| v.parse())
                .unwrap_or(Ok(DEFAULT_BODY_LIMIT_BYTES))
                .context("BODY_LIMIT_BYTES must be a valid number")?,
            body_log_prefix_bytes: env::var("BODY_LOG_PREFIX_BYTES")
                .map(|v| v.parse())
                .unwrap_or(Ok(DEFAULT_BODY_LOG_PREFIX_BYTES))
                .context("BODY_LOG_PREFIX_BYTES must be a valid number")?,
        })
    }

    /// Configuration suitable for tests: per-job slots under `jobs_root`.
    pub fn for_tests(worker: WorkerCommand, jobs_root: &Path) -> Self {
        Self {
            port: 0,
            worker,
            slot_policy: SlotPolicy::PerJob {
                root: jobs_root.to_path_buf(),
                keep: false,
            },
            webhook_timeout: Some(Duration::from_secs(5)),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            body_log_prefix_bytes: 1024,
        }
    }
}

fn optional_secs(key: &str) -> Result<Option<Duration>> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", key))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        _ => Ok(None),
    }
}

fn parse_bool(key: &str) -> Result<bool> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => bail!("{} must be a boolean, got '{}'", key, other),
        },
        Err(_) => Ok(false),
    }
}
