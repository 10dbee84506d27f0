//! Application setup and server configuration.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::scraping::{SlotPolicy, GENERIC_ERROR_MESSAGE};
use crate::kernel::ServerDeps;
use crate::server::middleware::{body_tap, BodyTapConfig};
use crate::server::routes::{health_handler, scrape_emails_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    pub slots: Arc<SlotPolicy>,
    pub started_at: DateTime<Utc>,
    active_jobs: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(deps: ServerDeps, slots: SlotPolicy) -> Self {
        Self {
            deps,
            slots: Arc::new(slots),
            started_at: Utc::now(),
            active_jobs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of scrape jobs currently running
    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::Relaxed)
    }

    /// Count a job as active until the returned guard is dropped
    pub fn track_job(&self) -> ActiveJobGuard {
        self.active_jobs.fetch_add(1, Ordering::Relaxed);
        ActiveJobGuard(self.active_jobs.clone())
    }
}

pub struct ActiveJobGuard(Arc<AtomicUsize>);

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Last-resort handler: a panic anywhere in request handling becomes a plain 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE).into_response()
}

/// Build the Axum application router
pub fn build_app(config: &Config, deps: ServerDeps) -> Router {
    let state = AppState::new(deps, config.slot_policy.clone());

    // Middleware layers (applied in reverse order - last added runs first)
    let scrape_routes = Router::new()
        .route("/scrape-emails", post(scrape_emails_handler))
        .layer(middleware::from_fn(body_tap))
        .layer(Extension(BodyTapConfig {
            max_logged_bytes: config.body_log_prefix_bytes,
        }))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

    Router::new()
        .merge(scrape_routes)
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
