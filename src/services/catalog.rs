//! Storage-facing ports used by the composition and view services.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{Exam, NewExam, Question, Specialty, Student, Subject, Theme};
use crate::db::types::PointValue;

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0} is still referenced by stored exams")]
    InUse(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("stored data is inconsistent: {0}")]
    Corrupt(String),
}

/// Collaborators of exam composition and exam reads.
#[async_trait]
pub(crate) trait ExamCatalog: Send + Sync {
    async fn questions_by_theme(&self, theme_id: &str) -> Result<Vec<Question>, CatalogError>;

    async fn all_specialties(&self) -> Result<Vec<Specialty>, CatalogError>;

    async fn student_for_account(&self, account_id: &str)
        -> Result<Option<Student>, CatalogError>;

    async fn has_student_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<bool, CatalogError>;

    /// Stores the exam atomically and returns its new id.
    async fn persist_exam(&self, exam: &NewExam) -> Result<String, CatalogError>;

    async fn find_exam(&self, exam_id: &str) -> Result<Option<Exam>, CatalogError>;

    async fn list_exams(&self) -> Result<Vec<Exam>, CatalogError>;

    async fn ping(&self) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionDraft {
    pub(crate) theme_id: String,
    pub(crate) text: String,
    pub(crate) answers: Vec<String>,
    pub(crate) points: PointValue,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct QuestionChanges {
    pub(crate) text: Option<String>,
    pub(crate) answers: Option<Vec<String>>,
    pub(crate) points: Option<PointValue>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Page {
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

/// Question bank maintenance for staff.
#[async_trait]
pub(crate) trait QuestionBank: Send + Sync {
    async fn list_questions(
        &self,
        theme_id: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Question>, i64), CatalogError>;

    async fn find_question(&self, id: &str) -> Result<Option<Question>, CatalogError>;

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, CatalogError>;

    /// Returns `None` when no question has this id.
    async fn update_question(
        &self,
        id: &str,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, CatalogError>;

    /// Returns the removed question, if it existed.
    async fn delete_question(&self, id: &str) -> Result<Option<Question>, CatalogError>;

    async fn list_subjects(&self) -> Result<Vec<Subject>, CatalogError>;

    async fn list_themes(&self) -> Result<Vec<Theme>, CatalogError>;

    async fn find_theme(&self, id: &str) -> Result<Option<Theme>, CatalogError>;

    async fn create_theme(&self, subject_id: &str, name: &str) -> Result<Theme, CatalogError>;

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, CatalogError>;
}
