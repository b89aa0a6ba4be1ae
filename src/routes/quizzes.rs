//! Quiz upload, retrieval, and class-analytics handlers

use crate::db::models::Quiz;
use crate::errors::{AppError, Result};
use crate::services::analysis::AnalysisRecord;
use crate::services::lectures::UploadedFile;
use crate::services::quizzes::{ResultsFile, UploadQuiz};
use crate::services::AppState;
use axum::{
    extract::multipart::{Multipart, MultipartError},
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_quiz).get(list_quizzes))
        .route("/{quiz_id}", get(get_quiz))
        .route("/by_class/{class_id}", get(quizzes_by_class))
        .route(
            "/class_analytics/{class_id}",
            post(run_class_analytics).get(get_class_analytics),
        )
}

fn multipart_err(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {}", e))
}

#[instrument(skip(state, multipart))]
async fn upload_quiz(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Quiz>)> {
    let mut class_id: Option<i64> = None;
    let mut quiz_title: Option<String> = None;
    let mut file: Option<UploadedFile> = None;
    let mut results: Option<ResultsFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "class_id" => {
                let text = field.text().await.map_err(multipart_err)?;
                class_id = Some(text.trim().parse().map_err(|_| {
                    AppError::Validation(format!("class_id must be an integer, got '{}'", text))
                })?);
            }
            "quiz_title" => {
                quiz_title = Some(field.text().await.map_err(multipart_err)?);
            }
            "file" => {
                let declared = field.content_type().unwrap_or_default().to_string();
                if declared != "application/pdf" {
                    return Err(AppError::Validation(format!(
                        "Invalid file type '{}' for quiz file. Allowed: application/pdf",
                        declared
                    )));
                }
                let filename = field.file_name().unwrap_or("quiz.pdf").to_string();
                let data = field.bytes().await.map_err(multipart_err)?.to_vec();
                file = Some(UploadedFile { filename, data });
            }
            "results_file" => {
                // May be PDF or plain text; the kind is resolved from the
                // filename and declared type during ingestion.
                let content_type = field.content_type().unwrap_or_default().to_string();
                let filename = field.file_name().unwrap_or("results").to_string();
                let data = field.bytes().await.map_err(multipart_err)?.to_vec();
                results = Some(ResultsFile {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let input = UploadQuiz {
        class_id: class_id.ok_or_else(|| AppError::MissingField("class_id".to_string()))?,
        quiz_title: quiz_title.ok_or_else(|| AppError::MissingField("quiz_title".to_string()))?,
        file: file.ok_or_else(|| AppError::MissingField("file".to_string()))?,
        results,
    };

    let quiz = state.quizzes.upload(input).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn list_quizzes(State(state): State<AppState>) -> Result<Json<Vec<Quiz>>> {
    Ok(Json(state.quizzes.list().await?))
}

async fn get_quiz(State(state): State<AppState>, Path(quiz_id): Path<i64>) -> Result<Json<Quiz>> {
    Ok(Json(state.quizzes.get(quiz_id).await?))
}

async fn quizzes_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<Quiz>>> {
    Ok(Json(state.quizzes.by_class(class_id).await?))
}

#[instrument(skip(state))]
async fn run_class_analytics(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<Json<AnalysisRecord>> {
    Ok(Json(state.analysis.run(class_id).await?))
}

async fn get_class_analytics(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<Json<AnalysisRecord>> {
    Ok(Json(state.analysis.latest(class_id).await?))
}
