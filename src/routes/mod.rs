pub mod classes;
pub mod health;
pub mod lectures;
pub mod quizzes;

use crate::config::AppConfig;
use crate::services::AppState;
use axum::{routing::get, Json, Router};
use serde_json::json;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health::health))
        .route("/readiness", get(health::readiness))
        .nest("/classes", classes::router())
        .nest("/lectures", lectures::router())
        .nest("/quizzes", quizzes::router())
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(crate::metrics::metrics_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(ConcurrencyLimitLayer::new(
            config.server.max_concurrent_requests,
        ))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Lecture Management System API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
