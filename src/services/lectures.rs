//! Lecture ingestion pipeline
//!
//! Handles the core upload workflow:
//! 1. Parse the comma-separated label text
//! 2. Persist raw bytes to the upload store
//! 3. Extract text from each provided file
//! 4. Insert lecture, files, and label links in one transaction
//! 5. Re-read the committed lecture for the response
//!
//! If anything fails after files hit disk, the just-written files are
//! deleted before the error surfaces; the transaction rolls back whole.

use crate::db::models::LectureDetail;
use crate::db::repository::{NewLecture, Repository};
use crate::errors::{AppError, Result};
use crate::extract::{self, FileKind};
use crate::storage::UploadStore;
use anyhow::anyhow;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Owning-user namespace for uploads until per-user auth is wired through
pub const DEFAULT_USER_ID: i64 = 1;

/// One uploaded file, buffered from the multipart stream
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Validated multipart input for a lecture upload
#[derive(Debug)]
pub struct UploadLecture {
    pub class_id: i64,
    pub lecture_title: String,
    pub lecture_date: NaiveDate,
    pub labels_raw: String,
    pub pdf: Option<UploadedFile>,
    pub transcript: Option<UploadedFile>,
}

pub struct LectureService {
    repo: Repository,
    store: UploadStore,
}

impl LectureService {
    pub fn new(repo: Repository, store: UploadStore) -> Self {
        Self { repo, store }
    }

    pub async fn upload(&self, input: UploadLecture) -> Result<LectureDetail> {
        let start = Instant::now();
        let labels = parse_labels(&input.labels_raw);

        let mut uploads: Vec<(FileKind, &UploadedFile)> = Vec::new();
        if let Some(file) = &input.pdf {
            uploads.push((FileKind::Pdf, file));
        }
        if let Some(file) = &input.transcript {
            uploads.push((FileKind::Transcript, file));
        }

        // Raw bytes go to durable storage first; these writes are the only
        // non-transactional side effect and get compensated on failure.
        let mut written: Vec<PathBuf> = Vec::new();
        for (_, file) in &uploads {
            let path = self
                .store
                .write(DEFAULT_USER_ID, &file.filename, &file.data)
                .await?;
            written.push(path);
        }

        let lecture_id = match self.persist(&input, &uploads, labels).await {
            Ok(id) => id,
            Err(e) => {
                self.cleanup(&written).await;
                return Err(e);
            }
        };

        // Re-read committed state so the response carries generated keys
        // and timestamps, never pre-commit values.
        let detail = self
            .repo
            .find_lecture_detail(lecture_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow!("committed lecture {} missing on re-read", lecture_id)))?;

        metrics::counter!("lectern_lectures_ingested_total").increment(1);
        metrics::counter!("lectern_lecture_files_ingested_total")
            .increment(detail.files.len() as u64);
        metrics::histogram!("lectern_lecture_ingest_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            lecture_id = lecture_id,
            class_id = input.class_id,
            files = detail.files.len(),
            labels = detail.labels.len(),
            total_ms = start.elapsed().as_millis(),
            "Lecture ingested"
        );

        Ok(detail)
    }

    async fn persist(
        &self,
        input: &UploadLecture,
        uploads: &[(FileKind, &UploadedFile)],
        labels: Vec<String>,
    ) -> Result<i64> {
        let mut files = Vec::with_capacity(uploads.len());
        for (kind, file) in uploads {
            let text = extract::extract(&file.data, *kind)?;
            files.push((*kind, text));
        }

        self.repo
            .create_lecture_bundle(NewLecture {
                class_id: input.class_id,
                lecture_title: input.lecture_title.clone(),
                lecture_date: input.lecture_date,
                files,
                labels,
            })
            .await
    }

    /// Best-effort compensating delete; never masks the original error
    async fn cleanup(&self, written: &[PathBuf]) {
        for path in written {
            if let Err(e) = self.store.delete(path).await {
                warn!(path = %path.display(), error = %e, "Failed to clean up upload after error");
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<LectureDetail> {
        self.repo
            .find_lecture_detail(id)
            .await?
            .ok_or_else(|| crate::not_found!("Lecture", id))
    }

    pub async fn list(&self) -> Result<Vec<LectureDetail>> {
        self.repo.list_lecture_details().await
    }

    pub async fn by_class(&self, class_id: i64) -> Result<Vec<LectureDetail>> {
        self.repo.lecture_details_by_class(class_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete_lecture(id).await? {
            Ok(())
        } else {
            Err(crate::not_found!("Lecture", id))
        }
    }
}

/// Split comma-separated label text: trim whitespace, drop empties,
/// preserve first-seen order, no deduplication.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_trims_and_drops_empties() {
        assert_eq!(
            parse_labels(" intro , basics ,, ,recursion"),
            vec!["intro", "basics", "recursion"]
        );
    }

    #[test]
    fn test_parse_labels_preserves_duplicates_and_case() {
        // One token per entry, case-sensitive; the Label uniqueness rule
        // collapses names later, not here.
        assert_eq!(
            parse_labels("Midterm, midterm, Midterm"),
            vec!["Midterm", "midterm", "Midterm"]
        );
    }

    #[test]
    fn test_parse_labels_empty_input() {
        assert!(parse_labels("").is_empty());
        assert!(parse_labels(" , , ").is_empty());
    }
}
