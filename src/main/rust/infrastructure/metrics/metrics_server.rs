use serde::Serialize;
use warp::Filter;

use super::prometheus_reporter::ACTIVE_SESSIONS;
use super::PrometheusReporter;

const SERVICE_NAME: &str = "nestmtx-bridge";

/// Health check response structure
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    active_sessions: i64,
}

impl HealthResponse {
    fn with_status(status: &'static str) -> Self {
        Self {
            status,
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            active_sessions: ACTIVE_SESSIONS.get(),
        }
    }
}

/// Serve `/metrics`, `/health`, `/livez` and `/readyz` until the process exits
pub async fn serve_metrics(port: u16) {
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let metrics_route = warp::path("metrics").map(|| {
        warp::reply::with_header(
            PrometheusReporter::gather_metrics(),
            "content-type",
            "text/plain; version=0.0.4; charset=utf-8",
        )
    });

    // Health plus the number of active sessions
    let health_route = warp::path("health")
        .map(|| warp::reply::json(&HealthResponse::with_status("healthy")));

    // Liveness probe endpoint (is the process running?)
    let liveness_route =
        warp::path("livez").map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Readiness probe endpoint (can the bridge accept lifecycle calls?)
    let readiness_route = warp::path("readyz")
        .map(|| warp::reply::json(&HealthResponse::with_status("ready")));

    let routes = metrics_route
        .or(health_route)
        .or(liveness_route)
        .or(readiness_route)
        .with(cors);

    tracing::info!(port, "Metrics server starting");

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
