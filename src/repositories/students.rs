use crate::db::models::Student;

pub(crate) async fn find_by_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, account_id, specialty_id FROM students WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_optional(executor)
    .await
}
