use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::db::models::{Specialty, Subject, Theme};
use crate::schemas::question::ThemeCreate;

pub(crate) fn themes_router() -> Router<AppState> {
    Router::new().route("/", get(list_themes).post(create_theme))
}

pub(crate) fn subjects_router() -> Router<AppState> {
    Router::new().route("/", get(list_subjects))
}

pub(crate) fn specialties_router() -> Router<AppState> {
    Router::new().route("/", get(list_specialties))
}

async fn list_themes(
    CurrentUser(_caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Theme>>, ApiError> {
    Ok(Json(state.bank().list_themes().await?))
}

async fn create_theme(
    CurrentAdmin(caller): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ThemeCreate>,
) -> Result<(StatusCode, Json<Theme>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if state.bank().find_subject(&payload.subject_id).await?.is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    let theme = state.bank().create_theme(&payload.subject_id, payload.name.trim()).await?;
    tracing::info!(theme_id = %theme.id, created_by = %caller.account_id, "Theme created");

    Ok((StatusCode::CREATED, Json(theme)))
}

async fn list_subjects(
    CurrentUser(_caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Subject>>, ApiError> {
    Ok(Json(state.bank().list_subjects().await?))
}

async fn list_specialties(
    CurrentUser(_caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Specialty>>, ApiError> {
    Ok(Json(state.catalog().all_specialties().await?))
}
