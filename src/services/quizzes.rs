//! Quiz ingestion
//!
//! A quiz upload is one required PDF (the quiz itself) and an optional
//! results file that may be PDF or plain text. Extraction failures persist
//! nothing; the insert is a single statement, so no partial-row state is
//! possible.

use crate::db::models::Quiz;
use crate::db::repository::{NewQuiz, Repository};
use crate::errors::Result;
use crate::extract::{self, FileKind};
use crate::services::lectures::UploadedFile;
use tracing::info;

#[derive(Debug)]
pub struct UploadQuiz {
    pub class_id: i64,
    pub quiz_title: String,
    /// The quiz document; always PDF
    pub file: UploadedFile,
    /// Optional performance results, PDF or plain text
    pub results: Option<ResultsFile>,
}

#[derive(Debug)]
pub struct ResultsFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct QuizService {
    repo: Repository,
}

impl QuizService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn upload(&self, input: UploadQuiz) -> Result<Quiz> {
        let quiz_content = extract::extract(&input.file.data, FileKind::Pdf)?;

        let quiz_results = match &input.results {
            Some(results) => {
                let kind = FileKind::detect(&results.filename, &results.content_type)?;
                Some(extract::extract(&results.data, kind)?)
            }
            None => None,
        };

        let quiz = self
            .repo
            .create_quiz(NewQuiz {
                class_id: input.class_id,
                quiz_title: input.quiz_title,
                quiz_content,
                quiz_results,
            })
            .await?;

        metrics::counter!("lectern_quizzes_ingested_total").increment(1);
        info!(
            quiz_id = quiz.id,
            class_id = quiz.class_id,
            has_results = quiz.quiz_results.is_some(),
            "Quiz ingested"
        );

        Ok(quiz)
    }

    pub async fn get(&self, id: i64) -> Result<Quiz> {
        self.repo
            .find_quiz(id)
            .await?
            .ok_or_else(|| crate::not_found!("Quiz", id))
    }

    pub async fn list(&self) -> Result<Vec<Quiz>> {
        self.repo.list_quizzes().await
    }

    pub async fn by_class(&self, class_id: i64) -> Result<Vec<Quiz>> {
        self.repo.quizzes_by_class(class_id).await
    }
}
