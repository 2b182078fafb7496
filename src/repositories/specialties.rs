use crate::db::models::Specialty;

pub(crate) async fn list_all(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<Specialty>, sqlx::Error> {
    sqlx::query_as::<_, Specialty>("SELECT id, name FROM specialties ORDER BY name")
        .fetch_all(executor)
        .await
}
