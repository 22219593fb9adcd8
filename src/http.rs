//! Lobby metrics endpoint.
//!
//! Serves the lobby's session, battle, command and flood counters at
//! `/metrics` in Prometheus text format. Started from `main` only when
//! `server.metrics_port` is nonzero, on its own task beside the game listener.

use axum::{Router, routing::get};
use std::net::SocketAddr;

/// GET /metrics: the current lobby counters.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Serve lobby metrics on `0.0.0.0:port`. A bind failure is logged and
/// leaves the lobby running without the endpoint.
pub async fn run_http_server(port: u16) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Lobby metrics endpoint listening");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind metrics HTTP server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Metrics HTTP server error");
    }
}
