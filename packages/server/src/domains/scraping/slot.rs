//! Job slots: the directory a worker runs in.
//!
//! The worker contract is two fixed file names relative to its working
//! directory: it reads [`CONFIG_FILE_NAME`] and leaves its addresses in
//! [`RESULT_FILE_NAME`]. With [`SlotPolicy::PerJob`] every job gets a fresh
//! directory, so concurrent jobs never see each other's files.
//! [`SlotPolicy::Shared`] keeps the legacy single slot, where concurrent jobs
//! race on both files.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::models::{parse_email_list, JobConfig};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const RESULT_FILE_NAME: &str = "final_combined_emails.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPolicy {
    /// One directory per job under `root`, removed afterwards unless `keep`
    PerJob { root: PathBuf, keep: bool },
    /// Every job shares `dir`
    Shared { dir: PathBuf },
}

impl SlotPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            SlotPolicy::PerJob { .. } => "per-job",
            SlotPolicy::Shared { .. } => "shared",
        }
    }

    /// Prepare the slot for `job_id`.
    pub async fn allocate(&self, job_id: Uuid) -> io::Result<JobSlot> {
        match self {
            SlotPolicy::PerJob { root, keep } => {
                let dir = root.join(job_id.to_string());
                tokio::fs::create_dir_all(&dir).await?;
                debug!(dir = %dir.display(), "Allocated job directory");
                Ok(JobSlot {
                    dir,
                    remove_on_release: !keep,
                })
            }
            SlotPolicy::Shared { dir } => {
                tokio::fs::create_dir_all(dir).await?;
                Ok(JobSlot {
                    dir: dir.clone(),
                    remove_on_release: false,
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct JobSlot {
    dir: PathBuf,
    remove_on_release: bool,
}

impl JobSlot {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE_NAME)
    }

    /// Replace `config.json` with `config`.
    ///
    /// Also removes a result file left behind by an earlier job, so a worker
    /// that exits 0 without writing one is caught by the result reader.
    pub async fn write_config(&self, config: &JobConfig) -> io::Result<()> {
        let body = serde_json::to_vec(config)?;
        tokio::fs::write(self.config_path(), body).await?;

        match tokio::fs::remove_file(self.result_path()).await {
            Ok(()) => debug!("Removed stale result file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Read back `config.json`.
    pub async fn read_config(&self) -> io::Result<JobConfig> {
        let body = tokio::fs::read(self.config_path()).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Remove the directory if this slot owns it.
    pub async fn release(self) {
        if !self.remove_on_release {
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove job directory");
        }
    }
}

/// Read and parse a worker result file.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read,
/// so one bad line does not cost the rest of the addresses.
pub async fn read_email_list(path: &Path) -> io::Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    let content = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = content {
        warn!(path = %path.display(), "Result file is not valid UTF-8, decoding lossily");
    }
    Ok(parse_email_list(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config() -> JobConfig {
        JobConfig {
            names: json!(["a", "b"]),
            domain: json!("x.com"),
            niche: json!("n"),
        }
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let policy = SlotPolicy::PerJob {
            root: root.path().to_path_buf(),
            keep: false,
        };
        let slot = policy.allocate(Uuid::new_v4()).await.unwrap();

        slot.write_config(&sample_config()).await.unwrap();

        assert_eq!(slot.read_config().await.unwrap(), sample_config());
    }

    #[tokio::test]
    async fn test_write_config_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SlotPolicy::Shared {
            dir: dir.path().to_path_buf(),
        };
        let slot = policy.allocate(Uuid::new_v4()).await.unwrap();

        let long = JobConfig {
            names: json!(vec!["a very long name that makes the file bigger"; 20]),
            domain: json!("long.example.com"),
            niche: json!("long niche"),
        };
        slot.write_config(&long).await.unwrap();
        slot.write_config(&sample_config()).await.unwrap();

        let raw = std::fs::read_to_string(slot.config_path()).unwrap();
        let parsed: JobConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, sample_config());
    }

    #[tokio::test]
    async fn test_write_config_clears_stale_result() {
        let dir = tempfile::tempdir().unwrap();
        let slot = SlotPolicy::Shared {
            dir: dir.path().to_path_buf(),
        }
        .allocate(Uuid::new_v4())
        .await
        .unwrap();
        std::fs::write(slot.result_path(), "old@x.com\n").unwrap();

        slot.write_config(&sample_config()).await.unwrap();

        assert!(!slot.result_path().exists());
    }

    #[tokio::test]
    async fn test_per_job_slots_are_distinct_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let policy = SlotPolicy::PerJob {
            root: root.path().to_path_buf(),
            keep: false,
        };

        let first = policy.allocate(Uuid::new_v4()).await.unwrap();
        let second = policy.allocate(Uuid::new_v4()).await.unwrap();
        assert_ne!(first.dir(), second.dir());
        assert!(first.dir().starts_with(root.path()));

        let first_dir = first.dir().to_path_buf();
        first.release().await;
        assert!(!first_dir.exists());
        assert!(second.dir().exists());
    }

    #[tokio::test]
    async fn test_keep_leaves_directory_behind() {
        let root = tempfile::tempdir().unwrap();
        let policy = SlotPolicy::PerJob {
            root: root.path().to_path_buf(),
            keep: true,
        };
        let slot = policy.allocate(Uuid::new_v4()).await.unwrap();
        let dir = slot.dir().to_path_buf();

        slot.release().await;

        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_shared_slot_is_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SlotPolicy::Shared {
            dir: dir.path().to_path_buf(),
        };
        let slot = policy.allocate(Uuid::new_v4()).await.unwrap();
        assert_eq!(slot.dir(), dir.path());

        slot.release().await;

        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_read_email_list_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_email_list(&dir.path().join(RESULT_FILE_NAME))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_email_list_parses_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RESULT_FILE_NAME);
        std::fs::write(&path, "jane@acme.com\n\njohn@acme.com\n").unwrap();

        let emails = read_email_list(&path).await.unwrap();

        assert_eq!(emails, vec!["jane@acme.com", "john@acme.com"]);
    }

    #[tokio::test]
    async fn test_read_email_list_decodes_invalid_utf8_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RESULT_FILE_NAME);
        std::fs::write(&path, b"jane@acme.com\n\xffbad\njohn@acme.com\n").unwrap();

        let emails = read_email_list(&path).await.unwrap();

        assert_eq!(emails, vec!["jane@acme.com", "\u{FFFD}bad", "john@acme.com"]);
    }
}
