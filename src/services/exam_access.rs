//! Role-scoped projections of stored exams.
//!
//! The caller's roles are reduced once to an [`Audience`]; each audience gets
//! its own view type, so a field a role must not see is absent from the type
//! rather than removed afterwards.

use std::collections::BTreeSet;

use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::Exam;
use crate::db::types::Role;
use crate::schemas::exam::{
    AdminExamView, EmptyExamView, ExamSummary, ExamView, QuestionView, StudentExamView,
    TeacherExamView,
};
use crate::services::catalog::{CatalogError, ExamCatalog};

#[derive(Debug, Clone)]
pub(crate) struct Caller {
    pub(crate) account_id: String,
    pub(crate) roles: BTreeSet<Role>,
}

/// The single role a request is served as. Admin outranks teacher, which
/// outranks student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Audience {
    Admin,
    Teacher,
    Student,
    Unprivileged,
}

impl Audience {
    pub(crate) fn of(roles: &BTreeSet<Role>) -> Self {
        if roles.contains(&Role::Admin) {
            Audience::Admin
        } else if roles.contains(&Role::Teacher) {
            Audience::Teacher
        } else if roles.contains(&Role::Student) {
            Audience::Student
        } else {
            Audience::Unprivileged
        }
    }

    pub(crate) fn is_staff(self) -> bool {
        matches!(self, Audience::Admin | Audience::Teacher)
    }
}

impl Caller {
    pub(crate) fn audience(&self) -> Audience {
        Audience::of(&self.roles)
    }
}

/// Everything a projection depends on besides the exam and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Viewer {
    Admin,
    Teacher,
    Student { has_submitted: bool },
    Unprivileged,
}

#[derive(Debug, Error)]
pub(crate) enum AccessError {
    #[error("account {account_id} has the student role but no student record")]
    IntegrityFault { account_id: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Renders `exam` for `caller`, looking up the caller's submission when they
/// are served as a student.
pub(crate) async fn render_exam_view(
    catalog: &dyn ExamCatalog,
    exam: &Exam,
    caller: &Caller,
    now: PrimitiveDateTime,
) -> Result<ExamView, AccessError> {
    let viewer = match caller.audience() {
        Audience::Admin => Viewer::Admin,
        Audience::Teacher => Viewer::Teacher,
        Audience::Student => {
            let student = catalog.student_for_account(&caller.account_id).await?.ok_or_else(
                || AccessError::IntegrityFault { account_id: caller.account_id.clone() },
            )?;
            let has_submitted = catalog.has_student_submitted(&exam.id, &student.id).await?;
            Viewer::Student { has_submitted }
        }
        Audience::Unprivileged => Viewer::Unprivileged,
    };

    Ok(render(exam, viewer, now))
}

/// Students see questions once the exam has started, including after it ended.
pub(crate) fn render(exam: &Exam, viewer: Viewer, now: PrimitiveDateTime) -> ExamView {
    match viewer {
        Viewer::Admin => ExamView::Admin(AdminExamView {
            summary: ExamSummary::from(exam),
            creator: exam.creator.clone(),
            questions: question_views(exam),
        }),
        Viewer::Teacher => ExamView::Teacher(TeacherExamView {
            summary: ExamSummary::from(exam),
            questions: question_views(exam),
        }),
        Viewer::Student { has_submitted } => ExamView::Student(StudentExamView {
            summary: ExamSummary::from(exam),
            questions: exam.has_started(now).then(|| question_views(exam)),
            has_submitted,
        }),
        Viewer::Unprivileged => ExamView::Empty(EmptyExamView {}),
    }
}

/// Staff see every exam, students only the ones that have not started yet.
pub(crate) fn render_exam_list<'a>(
    exams: impl IntoIterator<Item = &'a Exam>,
    audience: Audience,
    now: PrimitiveDateTime,
) -> Vec<ExamSummary> {
    match audience {
        Audience::Admin | Audience::Teacher => exams.into_iter().map(ExamSummary::from).collect(),
        Audience::Student => exams
            .into_iter()
            .filter(|exam| !exam.has_started(now))
            .map(ExamSummary::from)
            .collect(),
        Audience::Unprivileged => Vec::new(),
    }
}

fn question_views(exam: &Exam) -> Vec<QuestionView> {
    exam.questions.iter().map(QuestionView::from).collect()
}
