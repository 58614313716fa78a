//! Prometheus metrics collection middleware
//!
//! Records `http_requests_total` (counter) and `http_request_duration_seconds`
//! (histogram) for every request, with method/path/status labels.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Paths served by this application; anything else is labelled `other`
const KNOWN_PATHS: &[&str] = &["/", "/ask", "/health", "/metrics"];

/// Collapse unknown paths into one label to keep cardinality bounded.
fn normalize_path(path: &str) -> &str {
    KNOWN_PATHS
        .iter()
        .copied()
        .find(|known| *known == path)
        .unwrap_or("other")
}

/// Middleware that records request count and duration metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path()).to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths_pass_through() {
        assert_eq!(normalize_path("/ask"), "/ask");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn unknown_paths_collapse() {
        assert_eq!(normalize_path("/wp-admin/login.php"), "other");
        assert_eq!(normalize_path("/ask/extra"), "other");
    }
}
