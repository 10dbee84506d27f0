use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Extension, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use crate::domains::scraping::{run_scrape_job, JobError, JobRequest, SUCCESS_MESSAGE};
use crate::server::app::AppState;

/// Nesting depth accepted in form bodies (`names[]=a`, `names[0]=a`).
const FORM_MAX_DEPTH: usize = 5;

/// A job submitted as JSON or as an urlencoded form.
///
/// Forms use bracket syntax for lists, so `names[]=a&names[]=b` and
/// `names[0]=a&names[1]=b` both arrive as a list of names.
pub struct JobSubmission(pub JobRequest);

#[async_trait]
impl<S> FromRequest<S> for JobSubmission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if !is_form {
            let Json(request) = Json::<JobRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(request));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let request = serde_qs::Config::new(FORM_MAX_DEPTH, false)
            .deserialize_bytes::<JobRequest>(&body)
            .map_err(|e| {
                warn!(error = %e, "Failed to decode form body");
                (StatusCode::BAD_REQUEST, format!("Invalid form body: {}", e)).into_response()
            })?;
        Ok(Self(request))
    }
}

/// `POST /scrape-emails`
///
/// The job runs on its own task so a caller that disconnects does not cancel
/// the worker or the webhook. The response is written once the job is done.
pub async fn scrape_emails_handler(
    Extension(state): Extension<AppState>,
    JobSubmission(request): JobSubmission,
) -> Response {
    info!(
        record_id = %request.record_label(),
        names = request.name_count(),
        "Received scrape request"
    );

    let deps = state.deps.clone();
    let slots = state.slots.clone();
    let guard = state.track_job();
    let task = tokio::spawn(async move {
        let _guard = guard;
        run_scrape_job(&deps, &slots, request).await
    });

    match task.await {
        Ok(Ok(completion)) => {
            info!(
                job_id = %completion.job_id,
                emails = completion.emails_delivered,
                "Scrape job completed"
            );
            (StatusCode::OK, SUCCESS_MESSAGE).into_response()
        }
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!(error = %e, "Scrape job task did not complete");
            JobError::Internal(e.to_string()).into_response()
        }
    }
}
