use crate::db::models::{Subject, Theme};

pub(crate) const THEME_COLUMNS: &str = "id, subject_id, name";

pub(crate) async fn list_subjects(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects ORDER BY name")
        .fetch_all(executor)
        .await
}

pub(crate) async fn find_subject(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(executor: impl sqlx::PgExecutor<'_>) -> Result<Vec<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!("SELECT {THEME_COLUMNS} FROM themes ORDER BY name"))
        .fetch_all(executor)
        .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!("SELECT {THEME_COLUMNS} FROM themes WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    subject_id: &str,
    name: &str,
) -> Result<Theme, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!(
        "INSERT INTO themes (id, subject_id, name) VALUES ($1,$2,$3) RETURNING {THEME_COLUMNS}"
    ))
    .bind(id)
    .bind(subject_id)
    .bind(name)
    .fetch_one(executor)
    .await
}
