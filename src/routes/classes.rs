//! Class management handlers

use crate::db::models::Class;
use crate::errors::Result;
use crate::services::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class).get(list_classes))
        .route("/{class_id}", get(get_class).delete(delete_class))
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub class_name: String,
}

#[instrument(skip(state))]
async fn create_class(
    State(state): State<AppState>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<Class>)> {
    let class = state.classes.create(&payload.class_name).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<Class>>> {
    Ok(Json(state.classes.list().await?))
}

async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<Json<Class>> {
    Ok(Json(state.classes.get(class_id).await?))
}

async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<StatusCode> {
    state.classes.delete(class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
