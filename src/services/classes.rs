//! Class management

use crate::db::models::Class;
use crate::db::Repository;
use crate::errors::{AppError, Result};

pub struct ClassService {
    repo: Repository,
}

impl ClassService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a class from a raw name: trimmed, non-empty, unique
    pub async fn create(&self, class_name: &str) -> Result<Class> {
        let name = class_name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "class_name cannot be empty".to_string(),
            ));
        }
        self.repo.create_class(name).await
    }

    pub async fn list(&self) -> Result<Vec<Class>> {
        self.repo.list_classes().await
    }

    pub async fn get(&self, id: i64) -> Result<Class> {
        self.repo
            .find_class(id)
            .await?
            .ok_or_else(|| crate::not_found!("Class", id))
    }

    /// Delete a class and its whole subtree (lectures, files, label links,
    /// quizzes, analyses) via FK cascade
    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete_class(id).await? {
            Ok(())
        } else {
            Err(crate::not_found!("Class", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_trims_and_validates_name(pool: PgPool) {
        let service = ClassService::new(Repository::new(pool));

        let class = service.create("  CS101  ").await.unwrap();
        assert_eq!(class.class_name, "CS101");

        let err = service.create("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[sqlx::test]
    async fn test_get_and_delete_missing_class(pool: PgPool) {
        let service = ClassService::new(Repository::new(pool));

        let class = service.create("CS101").await.unwrap();
        assert_eq!(service.get(class.id).await.unwrap().id, class.id);

        service.delete(class.id).await.unwrap();
        assert!(matches!(
            service.get(class.id).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
        assert!(matches!(
            service.delete(class.id).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }
}
