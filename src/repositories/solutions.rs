pub(crate) async fn exists_for(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM solutions WHERE exam_id = $1 AND student_id = $2)",
    )
    .bind(exam_id)
    .bind(student_id)
    .fetch_one(executor)
    .await
}
