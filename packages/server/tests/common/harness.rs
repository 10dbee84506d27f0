//! Test harness: a real router, a real child-process worker, and an
//! in-process webhook receiver on an ephemeral port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use scrape_core::{
    domains::scraping::SlotPolicy,
    kernel::{ServerDeps, WebhookClient, WorkerCommand},
    server::build_app,
    Config,
};
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Clone)]
struct ReceiverState {
    status: StatusCode,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// Webhook endpoint that records every JSON body it receives.
pub struct CallbackReceiver {
    pub url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl CallbackReceiver {
    /// Start a receiver that answers every POST with `status`.
    pub async fn start(status: StatusCode) -> Result<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ReceiverState {
            status,
            received: received.clone(),
        };

        let app = Router::new()
            .route(
                "/hook",
                post(
                    |State(state): State<ReceiverState>, Json(body): Json<serde_json::Value>| async move {
                        state.received.lock().unwrap().push(body);
                        state.status
                    },
                ),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind callback receiver")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url: format!("http://{}/hook", addr),
            received,
        })
    }

    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }
}

/// A URL on a port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hook", addr)
}

/// Router wired to a shell-script worker, with per-job slots in a temp dir.
pub struct TestHarness {
    pub app: Router,
    pub jobs_root: PathBuf,
    pub scratch: PathBuf,
    _dirs: (TempDir, TempDir),
}

impl TestHarness {
    /// `script` is run with `sh` inside each job directory.
    pub fn with_worker_script(script: &str) -> Result<Self> {
        Self::with_worker_script_in(|_| script.to_string())
    }

    /// Like [`Self::with_worker_script`], with the script built from the
    /// harness scratch directory so it can leave evidence there.
    pub fn with_worker_script_in(make_script: impl FnOnce(&Path) -> String) -> Result<Self> {
        Self::build(make_script, false)
    }

    /// Like [`Self::with_worker_script`], but every job shares one slot
    /// directory (`jobs_root`) instead of getting its own.
    pub fn with_shared_slot(script: &str) -> Result<Self> {
        Self::build(|_| script.to_string(), true)
    }

    fn build(make_script: impl FnOnce(&Path) -> String, shared: bool) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let jobs = tempfile::tempdir()?;
        let scratch = tempfile::tempdir()?;
        let script_path = scratch.path().join("worker.sh");
        std::fs::write(&script_path, make_script(scratch.path()))?;

        let worker = WorkerCommand::new("sh").arg(script_path.to_string_lossy());
        let mut config = Config::for_tests(worker.clone(), jobs.path());
        if shared {
            config.slot_policy = SlotPolicy::Shared {
                dir: jobs.path().to_path_buf(),
            };
        }
        let webhook = WebhookClient::new(Some(Duration::from_secs(5)))?;
        let app = build_app(&config, ServerDeps::production(worker, webhook));

        Ok(Self {
            app,
            jobs_root: jobs.path().to_path_buf(),
            scratch: scratch.path().to_path_buf(),
            _dirs: (jobs, scratch),
        })
    }

    /// POST a raw JSON body to `/scrape-emails` and return status and body text.
    pub async fn post_raw(&self, body: impl Into<Body>) -> (StatusCode, String) {
        self.post_with_type("application/json", body).await
    }

    pub async fn post_form(&self, form: &str) -> (StatusCode, String) {
        self.post_with_type("application/x-www-form-urlencoded", form.to_string())
            .await
    }

    pub async fn post_with_type(
        &self,
        content_type: &str,
        body: impl Into<Body>,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/scrape-emails")
            .header("content-type", content_type)
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_job(&self, job: &serde_json::Value) -> (StatusCode, String) {
        self.post_raw(serde_json::to_vec(job).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn leftover_job_dirs(&self) -> usize {
        count_entries(&self.jobs_root)
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
