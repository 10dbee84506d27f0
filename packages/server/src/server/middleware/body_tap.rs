use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use tracing::{debug, info, warn};

/// How much of a request body the tap may write to the log.
#[derive(Clone, Copy, Debug)]
pub struct BodyTapConfig {
    pub max_logged_bytes: usize,
}

/// Middleware that logs the request body size and a capped prefix.
///
/// The body is buffered once and handed to the next layer unchanged; the size
/// limit itself is enforced by `RequestBodyLimitLayer` further out.
pub async fn body_tap(
    Extension(config): Extension<BodyTapConfig>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            warn!("Request body exceeds the configured limit");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let shown = &bytes[..bytes.len().min(config.max_logged_bytes)];
    info!(body_bytes = bytes.len(), "Received request body");
    debug!(
        truncated = shown.len() < bytes.len(),
        body = %String::from_utf8_lossy(shown),
        "Raw request body"
    );

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
