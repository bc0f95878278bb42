use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Logs method, path, status and latency of every routed request.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    if response.status().is_server_error() {
        tracing::warn!(%method, path = %path, status, elapsed_ms, "📡 Request failed");
    } else {
        tracing::info!(%method, path = %path, status, elapsed_ms, "📡 Request handled");
    }

    response
}
