//! Lecture upload and retrieval handlers
//!
//! The upload endpoint takes multipart form data. Declared content types
//! are validated up front, before any disk or database write.

use crate::db::models::LectureDetail;
use crate::errors::{AppError, Result};
use crate::services::lectures::{UploadLecture, UploadedFile};
use crate::services::AppState;
use axum::{
    extract::multipart::{Field, Multipart, MultipartError},
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_lecture))
        .route("/", get(list_lectures))
        .route("/{lecture_id}", get(get_lecture).delete(delete_lecture))
        .route("/by_class/{class_id}", get(lectures_by_class))
}

fn multipart_err(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {}", e))
}

/// Validate a file field's declared content type and buffer its bytes
async fn read_upload(
    field: Field<'_>,
    expected_type: &str,
    default_name: &str,
) -> Result<UploadedFile> {
    let declared = field.content_type().unwrap_or_default().to_string();
    if declared != expected_type {
        return Err(AppError::Validation(format!(
            "Invalid file type '{}'. Allowed: {}",
            declared, expected_type
        )));
    }
    let filename = field.file_name().unwrap_or(default_name).to_string();
    let data = field.bytes().await.map_err(multipart_err)?.to_vec();
    Ok(UploadedFile { filename, data })
}

#[instrument(skip(state, multipart))]
async fn upload_lecture(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<LectureDetail>)> {
    let mut class_id: Option<i64> = None;
    let mut lecture_title: Option<String> = None;
    let mut lecture_date: Option<NaiveDate> = None;
    let mut labels_raw = String::new();
    let mut pdf: Option<UploadedFile> = None;
    let mut transcript: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "class_id" => {
                let text = field.text().await.map_err(multipart_err)?;
                class_id = Some(text.trim().parse().map_err(|_| {
                    AppError::Validation(format!("class_id must be an integer, got '{}'", text))
                })?);
            }
            "lecture_title" => {
                lecture_title = Some(field.text().await.map_err(multipart_err)?);
            }
            "lecture_date" => {
                let text = field.text().await.map_err(multipart_err)?;
                lecture_date =
                    Some(NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
                        AppError::Validation(format!(
                            "lecture_date must be YYYY-MM-DD, got '{}'",
                            text
                        ))
                    })?);
            }
            "labels" => {
                labels_raw = field.text().await.map_err(multipart_err)?;
            }
            "pdf_file" => {
                pdf = Some(read_upload(field, "application/pdf", "lecture.pdf").await?);
            }
            "transcript_file" => {
                transcript = Some(read_upload(field, "text/plain", "transcript.txt").await?);
            }
            _ => {
                // Drain and ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    let input = UploadLecture {
        class_id: class_id.ok_or_else(|| AppError::MissingField("class_id".to_string()))?,
        lecture_title: lecture_title
            .ok_or_else(|| AppError::MissingField("lecture_title".to_string()))?,
        lecture_date: lecture_date
            .ok_or_else(|| AppError::MissingField("lecture_date".to_string()))?,
        labels_raw,
        pdf,
        transcript,
    };

    let detail = state.lectures.upload(input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list_lectures(State(state): State<AppState>) -> Result<Json<Vec<LectureDetail>>> {
    Ok(Json(state.lectures.list().await?))
}

async fn get_lecture(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<Json<LectureDetail>> {
    Ok(Json(state.lectures.get(lecture_id).await?))
}

async fn lectures_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<LectureDetail>>> {
    Ok(Json(state.lectures.by_class(class_id).await?))
}

async fn delete_lecture(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<StatusCode> {
    state.lectures.delete(lecture_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
