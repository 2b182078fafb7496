//! Postgres-backed implementation of the catalog ports.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{
    Answer, Exam, GradeBoundary, NewExam, Question, Specialty, Student, Subject, Theme,
};
use crate::repositories::{exams, questions, solutions, specialties, students, themes};
use crate::services::catalog::{
    CatalogError, ExamCatalog, Page, QuestionBank, QuestionChanges, QuestionDraft,
};

#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads questions and boundaries for the given exam rows in two queries.
    async fn hydrate(&self, rows: Vec<exams::ExamRow>) -> Result<Vec<Exam>, CatalogError> {
        let exam_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

        let mut questions_by_exam: HashMap<String, Vec<Question>> = HashMap::new();
        for row in questions::list_for_exams(&self.pool, &exam_ids).await? {
            questions_by_exam.entry(row.exam_id).or_default().push(to_question(row.question)?);
        }

        let mut boundaries_by_exam: HashMap<String, Vec<GradeBoundary>> = HashMap::new();
        for row in exams::list_boundaries(&self.pool, &exam_ids).await? {
            boundaries_by_exam.entry(row.exam_id).or_default().push(GradeBoundary {
                specialty: Specialty { id: row.specialty_id, name: row.specialty_name },
                min_score: row.min_score,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Exam {
                questions: questions_by_exam.remove(&row.id).unwrap_or_default(),
                grade_boundaries: boundaries_by_exam.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                start_date: row.start_date,
                end_date: row.end_date,
                time_to_solve_minutes: row.time_to_solve_minutes,
                creator: row.creator,
                created_at: row.created_at,
            })
            .collect())
    }
}

fn to_question(row: questions::QuestionRow) -> Result<Question, CatalogError> {
    let id = row.id.clone();
    Question::try_from(row).map_err(|err| CatalogError::Corrupt(format!("question {id}: {err}")))
}

fn answers_from(texts: Vec<String>) -> Vec<Answer> {
    texts.into_iter().map(|text| Answer { id: Uuid::new_v4().to_string(), text }).collect()
}

#[async_trait]
impl ExamCatalog for PgStore {
    async fn questions_by_theme(&self, theme_id: &str) -> Result<Vec<Question>, CatalogError> {
        questions::list_by_theme(&self.pool, theme_id)
            .await?
            .into_iter()
            .map(to_question)
            .collect()
    }

    async fn all_specialties(&self) -> Result<Vec<Specialty>, CatalogError> {
        Ok(specialties::list_all(&self.pool).await?)
    }

    async fn student_for_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Student>, CatalogError> {
        Ok(students::find_by_account(&self.pool, account_id).await?)
    }

    async fn has_student_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<bool, CatalogError> {
        Ok(solutions::exists_for(&self.pool, exam_id, student_id).await?)
    }

    async fn persist_exam(&self, exam: &NewExam) -> Result<String, CatalogError> {
        let id = Uuid::new_v4().to_string();
        let question_ids: Vec<&str> = exam.questions.iter().map(|q| q.id.as_str()).collect();

        let mut tx = self.pool.begin().await?;
        exams::create(
            &mut *tx,
            exams::CreateExam {
                id: &id,
                name: &exam.name,
                start_date: exam.start_date,
                end_date: exam.end_date,
                time_to_solve_minutes: exam.time_to_solve_minutes,
                creator: &exam.creator,
                created_at: primitive_now_utc(),
            },
        )
        .await?;
        exams::attach_questions(&mut *tx, &id, &question_ids).await?;
        exams::attach_boundaries(&mut *tx, &id, &exam.grade_boundaries).await?;
        tx.commit().await?;

        Ok(id)
    }

    async fn find_exam(&self, exam_id: &str) -> Result<Option<Exam>, CatalogError> {
        let Some(row) = exams::find_by_id(&self.pool, exam_id).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, CatalogError> {
        let rows = exams::list_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionBank for PgStore {
    async fn list_questions(
        &self,
        theme_id: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Question>, i64), CatalogError> {
        let total = questions::count(&self.pool, theme_id).await?;
        let items = questions::list(&self.pool, theme_id, page.skip, page.limit)
            .await?
            .into_iter()
            .map(to_question)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, total))
    }

    async fn find_question(&self, id: &str) -> Result<Option<Question>, CatalogError> {
        questions::find_by_id(&self.pool, id).await?.map(to_question).transpose()
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, CatalogError> {
        let answers = answers_from(draft.answers);
        let row = questions::create(
            &self.pool,
            questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                theme_id: &draft.theme_id,
                text: &draft.text,
                answers: &answers,
                points: draft.points,
                now: primitive_now_utc(),
            },
        )
        .await?;
        to_question(row)
    }

    async fn update_question(
        &self,
        id: &str,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, CatalogError> {
        let answers = changes.answers.map(answers_from);
        questions::update(
            &self.pool,
            id,
            questions::UpdateQuestion {
                text: changes.text.as_deref(),
                answers: answers.as_deref(),
                points: changes.points,
                now: primitive_now_utc(),
            },
        )
        .await?
        .map(to_question)
        .transpose()
    }

    async fn delete_question(&self, id: &str) -> Result<Option<Question>, CatalogError> {
        match questions::delete_by_id(&self.pool, id).await {
            Ok(row) => row.map(to_question).transpose(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(CatalogError::InUse(format!("question {id}")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, CatalogError> {
        Ok(themes::list_subjects(&self.pool).await?)
    }

    async fn list_themes(&self) -> Result<Vec<Theme>, CatalogError> {
        Ok(themes::list(&self.pool).await?)
    }

    async fn find_theme(&self, id: &str) -> Result<Option<Theme>, CatalogError> {
        Ok(themes::find_by_id(&self.pool, id).await?)
    }

    async fn create_theme(&self, subject_id: &str, name: &str) -> Result<Theme, CatalogError> {
        match themes::create(&self.pool, &Uuid::new_v4().to_string(), subject_id, name).await {
            Ok(theme) => Ok(theme),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CatalogError::Duplicate(format!("theme {name}")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, CatalogError> {
        Ok(themes::find_subject(&self.pool, id).await?)
    }
}
