//! Exam creation: validate boundaries, fetch candidates, compose, persist.

use futures::future::try_join_all;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::metrics::{COMPOSED_QUESTIONS, EXAMS_COMPOSED, EXAM_COMPOSITION_FAILURES};
use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, GradeBoundary, NewExam};
use crate::services::boundaries::{self, BoundaryError};
use crate::services::catalog::{CatalogError, ExamCatalog};
use crate::services::composer::{self, ExamCreationFilter, InsufficientQuestions};
use crate::services::question_pool::QuestionPool;

#[derive(Debug, Clone)]
pub(crate) struct ExamDraft {
    pub(crate) name: String,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) filters: Vec<ExamCreationFilter>,
    pub(crate) grade_boundaries: Vec<GradeBoundary>,
}

#[derive(Debug, Error)]
pub(crate) enum ComposeError {
    #[error(transparent)]
    Boundaries(#[from] BoundaryError),
    #[error(transparent)]
    InsufficientQuestions(#[from] InsufficientQuestions),
    #[error("exam requests {requested} questions but at most {limit} are allowed")]
    TooManyQuestions { requested: u64, limit: u32 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ComposeError {
    fn reason(&self) -> &'static str {
        match self {
            ComposeError::Boundaries(_) => "boundaries",
            ComposeError::InsufficientQuestions(_) => "insufficient_questions",
            ComposeError::TooManyQuestions { .. } => "too_many_questions",
            ComposeError::Catalog(_) => "catalog",
        }
    }
}

/// Composes and stores a new exam created by `creator`.
///
/// Nothing is persisted unless every earlier step succeeded.
pub(crate) async fn compose_exam(
    catalog: &dyn ExamCatalog,
    draft: ExamDraft,
    creator: &str,
    max_questions: u32,
) -> Result<Exam, ComposeError> {
    let result = compose_and_persist(catalog, draft, creator, max_questions).await;

    match &result {
        Ok(exam) => {
            metrics::counter!(EXAMS_COMPOSED).increment(1);
            metrics::histogram!(COMPOSED_QUESTIONS).record(exam.questions.len() as f64);
            tracing::info!(
                exam_id = %exam.id,
                creator = %creator,
                questions = exam.questions.len(),
                "Exam composed"
            );
        }
        Err(err) => {
            metrics::counter!(EXAM_COMPOSITION_FAILURES, "reason" => err.reason()).increment(1);
            tracing::warn!(error = %err, reason = err.reason(), "Exam composition rejected");
        }
    }

    result
}

async fn compose_and_persist(
    catalog: &dyn ExamCatalog,
    draft: ExamDraft,
    creator: &str,
    max_questions: u32,
) -> Result<Exam, ComposeError> {
    let requested = composer::total_requested(&draft.filters);
    if requested > u64::from(max_questions) {
        return Err(ComposeError::TooManyQuestions { requested, limit: max_questions });
    }

    if !draft.grade_boundaries.is_empty() {
        let specialties = catalog.all_specialties().await?;
        boundaries::validate(&draft.grade_boundaries, &specialties)?;
    }

    let theme_ids = referenced_themes(&draft.filters);
    tracing::debug!(themes = theme_ids.len(), "Fetching candidate questions");
    let fetched =
        try_join_all(theme_ids.iter().map(|theme_id| catalog.questions_by_theme(theme_id)))
            .await?;

    let pool = QuestionPool::build(fetched.into_iter().flatten());
    tracing::debug!(candidates = pool.len(), "Candidate pool built");
    let questions = composer::compose(&draft.filters, &pool)?;

    let exam = NewExam {
        name: draft.name,
        start_date: draft.start_date,
        end_date: draft.end_date,
        time_to_solve_minutes: draft.time_to_solve_minutes,
        questions,
        creator: creator.to_string(),
        grade_boundaries: draft.grade_boundaries,
    };

    let exam_id = catalog.persist_exam(&exam).await?;

    Ok(Exam::from_new(exam_id, exam, primitive_now_utc()))
}

/// Distinct theme ids in first-reference order.
fn referenced_themes(filters: &[ExamCreationFilter]) -> Vec<String> {
    let mut themes: Vec<String> = Vec::new();
    for theme_filter in filters.iter().flat_map(|filter| &filter.theme_filters) {
        if !themes.contains(&theme_filter.theme_id) {
            themes.push(theme_filter.theme_id.clone());
        }
    }
    themes
}
