//! Repository pattern for database operations
//!
//! All SQL lives here. Multi-row writes run inside a single transaction;
//! any failed statement rolls back the whole batch. Constraint violations
//! are mapped to domain errors at this boundary: a foreign-key violation on
//! insert means the referenced class does not exist, and a unique violation
//! on class creation means the name is taken.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::extract::FileKind;
use crate::not_found;
use chrono::NaiveDate;
use sqlx::PgPool;

/// Input for the transactional lecture insert
#[derive(Debug)]
pub struct NewLecture {
    pub class_id: i64,
    pub lecture_title: String,
    pub lecture_date: NaiveDate,
    /// Extracted text per provided file, in upload order
    pub files: Vec<(FileKind, String)>,
    /// Trimmed non-empty label tokens, in first-seen order, not deduplicated
    pub labels: Vec<String>,
}

/// Input for the single-statement quiz insert
#[derive(Debug)]
pub struct NewQuiz {
    pub class_id: i64,
    pub quiz_title: String,
    pub quiz_content: String,
    pub quiz_results: Option<String>,
}

#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn is_fk_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Class Operations
    // ========================================================================

    pub async fn create_class(&self, class_name: &str) -> Result<Class> {
        sqlx::query_as::<_, Class>(
            "INSERT INTO classes (class_name) VALUES ($1)
             RETURNING id, class_name, created_at",
        )
        .bind(class_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists(format!("class '{}'", class_name))
            } else {
                e.into()
            }
        })
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>> {
        sqlx::query_as::<_, Class>(
            "SELECT id, class_name, created_at FROM classes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_class(&self, id: i64) -> Result<Option<Class>> {
        sqlx::query_as::<_, Class>("SELECT id, class_name, created_at FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// Delete a class; lectures, files, label links, quizzes, and analyses
    /// go with it via FK cascade. Returns false when no such class exists.
    pub async fn delete_class(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Lecture Operations
    // ========================================================================

    /// Insert a lecture with its files and label links in one transaction.
    /// Labels are upserted atomically: insert, and on a name conflict reuse
    /// the existing row. Commit happens only after every row succeeds.
    pub async fn create_lecture_bundle(&self, new: NewLecture) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let lecture_id: i64 = sqlx::query_scalar(
            "INSERT INTO lectures (class_id, lecture_title, lecture_date)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.class_id)
        .bind(&new.lecture_title)
        .bind(new.lecture_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                not_found!("Class", new.class_id)
            } else {
                e.into()
            }
        })?;

        for (kind, text) in &new.files {
            sqlx::query(
                "INSERT INTO lecture_files (lecture_id, file_type, extracted_text)
                 VALUES ($1, $2, $3)",
            )
            .bind(lecture_id)
            .bind(kind.as_str())
            .bind(text)
            .execute(&mut *tx)
            .await?;
        }

        for name in &new.labels {
            let label_id: i64 = sqlx::query_scalar(
                "INSERT INTO labels (label_name) VALUES ($1)
                 ON CONFLICT (label_name) DO UPDATE SET label_name = EXCLUDED.label_name
                 RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            // One link row per input token, duplicates included
            sqlx::query("INSERT INTO lecture_labels (lecture_id, label_id) VALUES ($1, $2)")
                .bind(lecture_id)
                .bind(label_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        Ok(lecture_id)
    }

    /// Read a lecture with its files and labels from committed state
    pub async fn find_lecture_detail(&self, id: i64) -> Result<Option<LectureDetail>> {
        let Some(lecture) = sqlx::query_as::<_, Lecture>(
            "SELECT id, class_id, lecture_title, lecture_date, created_at
             FROM lectures WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let files = sqlx::query_as::<_, LectureFile>(
            "SELECT id, lecture_id, file_type, extracted_text, uploaded_at
             FROM lecture_files WHERE lecture_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let labels = sqlx::query_as::<_, LectureLabel>(
            "SELECT l.id, l.label_name, ll.lecture_id
             FROM labels l
             JOIN lecture_labels ll ON l.id = ll.label_id
             WHERE ll.lecture_id = $1
             ORDER BY l.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(LectureDetail::assemble(lecture, files, labels)))
    }

    pub async fn list_lecture_details(&self) -> Result<Vec<LectureDetail>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM lectures ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        self.load_details(ids).await
    }

    pub async fn lecture_details_by_class(&self, class_id: i64) -> Result<Vec<LectureDetail>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM lectures WHERE class_id = $1 ORDER BY created_at DESC",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        self.load_details(ids).await
    }

    async fn load_details(&self, ids: Vec<i64>) -> Result<Vec<LectureDetail>> {
        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = self.find_lecture_detail(id).await? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    /// Delete a lecture; its files and label links cascade
    pub async fn delete_lecture(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lectures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Quiz Operations
    // ========================================================================

    pub async fn create_quiz(&self, new: NewQuiz) -> Result<Quiz> {
        sqlx::query_as::<_, Quiz>(
            "INSERT INTO quizzes (class_id, quiz_title, quiz_content, quiz_results)
             VALUES ($1, $2, $3, $4)
             RETURNING id, class_id, quiz_title, quiz_content, quiz_results, created_at",
        )
        .bind(new.class_id)
        .bind(&new.quiz_title)
        .bind(&new.quiz_content)
        .bind(&new.quiz_results)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                not_found!("Class", new.class_id)
            } else {
                e.into()
            }
        })
    }

    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        sqlx::query_as::<_, Quiz>(
            "SELECT id, class_id, quiz_title, quiz_content, quiz_results, created_at
             FROM quizzes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>> {
        sqlx::query_as::<_, Quiz>(
            "SELECT id, class_id, quiz_title, quiz_content, quiz_results, created_at
             FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn quizzes_by_class(&self, class_id: i64) -> Result<Vec<Quiz>> {
        sqlx::query_as::<_, Quiz>(
            "SELECT id, class_id, quiz_title, quiz_content, quiz_results, created_at
             FROM quizzes WHERE class_id = $1 ORDER BY created_at DESC",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    // ========================================================================
    // Analysis Operations
    // ========================================================================

    /// All extracted lecture text for a class, in retrieval order
    pub async fn lecture_texts_for_class(&self, class_id: i64) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT lf.extracted_text
             FROM lecture_files lf
             JOIN lectures l ON lf.lecture_id = l.id
             WHERE l.class_id = $1
             ORDER BY lf.id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Quiz content and optional results for a class, in retrieval order
    pub async fn quiz_texts_for_class(&self, class_id: i64) -> Result<Vec<(String, Option<String>)>> {
        sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT quiz_content, quiz_results FROM quizzes WHERE class_id = $1 ORDER BY id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Replace the class's analysis: delete all prior rows, insert the new
    /// one, atomically. A reader never observes zero rows for a class that
    /// previously had an analysis.
    pub async fn replace_analysis(&self, class_id: i64, analysis_text: &str) -> Result<ClassAnalysis> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM class_analysis WHERE class_id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ClassAnalysis>(
            "INSERT INTO class_analysis (class_id, analysis_text)
             VALUES ($1, $2)
             RETURNING id, class_id, analysis_text, created_at",
        )
        .bind(class_id)
        .bind(analysis_text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                not_found!("Class", class_id)
            } else {
                e.into()
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        Ok(row)
    }

    /// Most recent analysis row for a class, if any
    pub async fn latest_analysis(&self, class_id: i64) -> Result<Option<ClassAnalysis>> {
        sqlx::query_as::<_, ClassAnalysis>(
            "SELECT id, class_id, analysis_text, created_at
             FROM class_analysis WHERE class_id = $1
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture_for(class_id: i64) -> NewLecture {
        NewLecture {
            class_id,
            lecture_title: "Intro".to_string(),
            lecture_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            files: vec![(FileKind::Transcript, "Hello world".to_string())],
            labels: Vec::new(),
        }
    }

    fn quiz_for(class_id: i64) -> NewQuiz {
        NewQuiz {
            class_id,
            quiz_title: "Quiz 1".to_string(),
            quiz_content: "Q1: define recursion".to_string(),
            quiz_results: None,
        }
    }

    async fn count(pool: &PgPool, sql: &str, class_id: i64) -> i64 {
        sqlx::query_scalar(sql)
            .bind(class_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_replace_analysis_keeps_exactly_one_row(pool: PgPool) {
        let repo = Repository::new(pool.clone());
        let class = repo.create_class("CS101").await.unwrap();

        repo.replace_analysis(class.id, r#"{"run":1}"#).await.unwrap();
        let second = repo.replace_analysis(class.id, r#"{"run":2}"#).await.unwrap();

        let rows = count(
            &pool,
            "SELECT count(*) FROM class_analysis WHERE class_id = $1",
            class.id,
        )
        .await;
        assert_eq!(rows, 1);

        let latest = repo.latest_analysis(class.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.analysis_text, r#"{"run":2}"#);
    }

    #[sqlx::test]
    async fn test_delete_class_removes_only_its_own_subtree(pool: PgPool) {
        let repo = Repository::new(pool.clone());
        let doomed = repo.create_class("CS101").await.unwrap();
        let kept = repo.create_class("CS102").await.unwrap();

        let mut doomed_lecture = lecture_for(doomed.id);
        doomed_lecture.labels = vec!["intro".to_string()];
        let doomed_lecture_id = repo.create_lecture_bundle(doomed_lecture).await.unwrap();

        let mut kept_lecture = lecture_for(kept.id);
        kept_lecture.labels = vec!["intro".to_string()];
        let kept_lecture_id = repo.create_lecture_bundle(kept_lecture).await.unwrap();

        repo.create_quiz(quiz_for(doomed.id)).await.unwrap();
        repo.create_quiz(quiz_for(kept.id)).await.unwrap();
        repo.replace_analysis(doomed.id, r#"{"doomed":true}"#).await.unwrap();
        repo.replace_analysis(kept.id, r#"{"kept":true}"#).await.unwrap();

        assert!(repo.delete_class(doomed.id).await.unwrap());

        // The deleted class's subtree is gone
        assert!(repo.find_class(doomed.id).await.unwrap().is_none());
        assert!(repo.find_lecture_detail(doomed_lecture_id).await.unwrap().is_none());
        assert!(repo.quizzes_by_class(doomed.id).await.unwrap().is_empty());
        assert!(repo.latest_analysis(doomed.id).await.unwrap().is_none());

        // The other class is untouched
        let detail = repo.find_lecture_detail(kept_lecture_id).await.unwrap().unwrap();
        assert_eq!(detail.files.len(), 1);
        assert_eq!(detail.labels.len(), 1);
        assert_eq!(repo.quizzes_by_class(kept.id).await.unwrap().len(), 1);
        assert!(repo.latest_analysis(kept.id).await.unwrap().is_some());

        // The shared label row survives; only the dead link rows cascade
        let label_rows: i64 =
            sqlx::query_scalar("SELECT count(*) FROM labels WHERE label_name = 'intro'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(label_rows, 1);
        let links = count(
            &pool,
            "SELECT count(*) FROM lecture_labels WHERE lecture_id = $1",
            kept_lecture_id,
        )
        .await;
        assert_eq!(links, 1);
    }

    #[sqlx::test]
    async fn test_duplicate_label_tokens_share_one_label_row(pool: PgPool) {
        let repo = Repository::new(pool.clone());
        let class = repo.create_class("CS101").await.unwrap();

        let mut new = lecture_for(class.id);
        new.labels = vec![
            "Midterm".to_string(),
            "Midterm".to_string(),
            "review".to_string(),
        ];
        let lecture_id = repo.create_lecture_bundle(new).await.unwrap();

        // One link row per input token, duplicates included
        let detail = repo.find_lecture_detail(lecture_id).await.unwrap().unwrap();
        assert_eq!(detail.labels.len(), 3);

        // But only one Label row per name
        let label_rows: i64 =
            sqlx::query_scalar("SELECT count(*) FROM labels WHERE label_name = 'Midterm'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(label_rows, 1);
    }

    #[sqlx::test]
    async fn test_failed_bundle_insert_leaves_no_rows(pool: PgPool) {
        let repo = Repository::new(pool.clone());

        let mut new = lecture_for(9999);
        new.labels = vec!["orphan".to_string()];
        let err = repo.create_lecture_bundle(new).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let lectures: i64 = sqlx::query_scalar("SELECT count(*) FROM lectures")
            .fetch_one(&pool)
            .await
            .unwrap();
        let files: i64 = sqlx::query_scalar("SELECT count(*) FROM lecture_files")
            .fetch_one(&pool)
            .await
            .unwrap();
        let labels: i64 = sqlx::query_scalar("SELECT count(*) FROM labels")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((lectures, files, labels), (0, 0, 0));
    }

    #[sqlx::test]
    async fn test_create_class_duplicate_name_conflicts(pool: PgPool) {
        let repo = Repository::new(pool);
        repo.create_class("CS101").await.unwrap();
        let err = repo.create_class("CS101").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }
}
