use sqlx::types::Json as SqlxJson;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Answer, Question};
use crate::db::types::{InvalidPointValue, PointValue};

pub(crate) const COLUMNS: &str = "id, theme_id, text, answers, points, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QuestionRow {
    pub(crate) id: String,
    pub(crate) theme_id: String,
    pub(crate) text: String,
    pub(crate) answers: SqlxJson<Vec<Answer>>,
    pub(crate) points: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl TryFrom<QuestionRow> for Question {
    type Error = InvalidPointValue;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            points: PointValue::try_from(i64::from(row.points))?,
            id: row.id,
            theme_id: row.theme_id,
            text: row.text,
            answers: row.answers.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A question row tagged with the exam it belongs to.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamQuestionRow {
    pub(crate) exam_id: String,
    #[sqlx(flatten)]
    pub(crate) question: QuestionRow,
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) theme_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) answers: &'a [Answer],
    pub(crate) points: PointValue,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) struct UpdateQuestion<'a> {
    pub(crate) text: Option<&'a str>,
    pub(crate) answers: Option<&'a [Answer]>,
    pub(crate) points: Option<PointValue>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn list_by_theme(
    executor: impl sqlx::PgExecutor<'_>,
    theme_id: &str,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE theme_id = $1 ORDER BY points, id"
    ))
    .bind(theme_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_for_exams(
    executor: impl sqlx::PgExecutor<'_>,
    exam_ids: &[String],
) -> Result<Vec<ExamQuestionRow>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamQuestionRow>(
        "SELECT eq.exam_id, q.id, q.theme_id, q.text, q.answers, q.points,
                q.created_at, q.updated_at
         FROM exam_questions eq
         JOIN questions q ON q.id = eq.question_id
         WHERE eq.exam_id = ANY($1)
         ORDER BY eq.exam_id, eq.position",
    )
    .bind(exam_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    theme_id: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions WHERE 1=1"));
    if let Some(theme_id) = theme_id {
        builder.push(" AND theme_id = ");
        builder.push_bind(theme_id);
    }
    builder.push(" ORDER BY created_at DESC, id OFFSET ");
    builder.push_bind(skip);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    builder.build_query_as::<QuestionRow>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, theme_id: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions WHERE 1=1");
    if let Some(theme_id) = theme_id {
        builder.push(" AND theme_id = ");
        builder.push_bind(theme_id);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<QuestionRow, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "INSERT INTO questions (id, theme_id, text, answers, points, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.theme_id)
    .bind(params.text)
    .bind(SqlxJson(params.answers))
    .bind(i32::from(params.points.get()))
    .bind(params.now)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateQuestion<'_>,
) -> Result<Option<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "UPDATE questions SET
            text = COALESCE($2, text),
            answers = COALESCE($3, answers),
            points = COALESCE($4, points),
            updated_at = $5
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(params.text)
    .bind(params.answers.map(SqlxJson))
    .bind(params.points.map(|points| i32::from(points.get())))
    .bind(params.now)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "DELETE FROM questions WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
