use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and return the render route
pub fn metrics_router() -> Router {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    Router::new().route("/metrics", get(|| async move { handle.render() }))
}
