use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::GradeBoundary;

pub(crate) const COLUMNS: &str =
    "id, name, start_date, end_date, time_to_solve_minutes, creator, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) creator: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BoundaryRow {
    pub(crate) exam_id: String,
    pub(crate) specialty_id: String,
    pub(crate) specialty_name: String,
    pub(crate) min_score: f64,
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) creator: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exams (
            id, name, start_date, end_date, time_to_solve_minutes, creator, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(params.id)
    .bind(params.name)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.time_to_solve_minutes)
    .bind(params.creator)
    .bind(params.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Links questions to the exam, keeping their composition order.
pub(crate) async fn attach_questions(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    question_ids: &[&str],
) -> Result<(), sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(());
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("INSERT INTO exam_questions (exam_id, question_id, position) ");
    builder.push_values(question_ids.iter().enumerate(), |mut row, (position, question_id)| {
        row.push_bind(exam_id).push_bind(*question_id).push_bind(position as i32);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

/// A specialty may carry several thresholds, so rows are keyed by position.
pub(crate) async fn attach_boundaries(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    boundaries: &[GradeBoundary],
) -> Result<(), sqlx::Error> {
    if boundaries.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO exam_grade_boundaries (exam_id, position, specialty_id, min_score) ",
    );
    builder.push_values(boundaries.iter().enumerate(), |mut row, (position, boundary)| {
        row.push_bind(exam_id)
            .push_bind(position as i32)
            .push_bind(boundary.specialty.id.as_str())
            .push_bind(boundary.min_score);
    });
    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamRow>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_all(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<ExamRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamRow>(&format!("SELECT {COLUMNS} FROM exams ORDER BY start_date, id"))
        .fetch_all(executor)
        .await
}

pub(crate) async fn list_boundaries(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[String],
) -> Result<Vec<BoundaryRow>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, BoundaryRow>(
        "SELECT b.exam_id, b.specialty_id, s.name AS specialty_name, b.min_score
         FROM exam_grade_boundaries b
         JOIN specialties s ON s.id = b.specialty_id
         WHERE b.exam_id = ANY($1)
         ORDER BY b.exam_id, b.position",
    )
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}
