use crate::ai::ChatClient;
use crate::db::{Db, Repository};
use crate::services::analysis::AnalysisService;
use crate::services::classes::ClassService;
use crate::services::lectures::LectureService;
use crate::services::quizzes::QuizService;
use crate::storage::UploadStore;
use std::sync::Arc;

pub mod analysis;
pub mod classes;
pub mod lectures;
pub mod quizzes;

// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub classes: Arc<ClassService>,
    pub lectures: Arc<LectureService>,
    pub quizzes: Arc<QuizService>,
    pub analysis: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(db: Db, store: UploadStore, chat: Arc<dyn ChatClient>) -> Self {
        // Repository is cheap to clone (PgPool is an Arc internally)
        let repo = Repository::new(db.pool().clone());

        Self {
            db,
            classes: Arc::new(ClassService::new(repo.clone())),
            lectures: Arc::new(LectureService::new(repo.clone(), store)),
            quizzes: Arc::new(QuizService::new(repo.clone())),
            analysis: Arc::new(AnalysisService::new(repo, chat)),
        }
    }
}
