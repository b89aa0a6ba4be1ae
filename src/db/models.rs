//! Row types and assembled response shapes

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lecture {
    pub id: i64,
    pub class_id: i64,
    pub lecture_title: String,
    pub lecture_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LectureFile {
    pub id: i64,
    pub lecture_id: i64,
    pub file_type: String,
    pub extracted_text: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LectureLabel {
    pub id: i64,
    pub label_name: String,
    pub lecture_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub class_id: i64,
    pub quiz_title: String,
    pub quiz_content: String,
    pub quiz_results: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClassAnalysis {
    pub id: i64,
    pub class_id: i64,
    pub analysis_text: String,
    pub created_at: DateTime<Utc>,
}

/// A lecture assembled with its files and labels, read back from committed
/// state after an upload.
#[derive(Debug, Clone, Serialize)]
pub struct LectureDetail {
    pub id: i64,
    pub class_id: i64,
    pub lecture_title: String,
    pub lecture_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub files: Vec<LectureFile>,
    pub labels: Vec<LectureLabel>,
}

impl LectureDetail {
    pub fn assemble(lecture: Lecture, files: Vec<LectureFile>, labels: Vec<LectureLabel>) -> Self {
        Self {
            id: lecture.id,
            class_id: lecture.class_id,
            lecture_title: lecture.lecture_title,
            lecture_date: lecture.lecture_date,
            created_at: lecture.created_at,
            files,
            labels,
        }
    }
}
