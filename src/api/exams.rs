use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::schemas::exam::{ExamCreate, ExamCreatedResponse, ExamSummary, ExamView};
use crate::services::exam_access::{render_exam_list, render_exam_view};
use crate::services::exam_creation::{compose_exam, ExamDraft};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(list_exams))
        .route("/upcoming", get(list_upcoming_exams))
        .route("/past", get(list_past_exams))
        .route("/:exam_id", get(get_exam))
}

async fn create_exam(
    CurrentStaff(caller): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamCreatedResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let max_questions = state.settings().exam().max_questions_per_exam;
    let exam = compose_exam(
        state.catalog(),
        ExamDraft::from(payload),
        &caller.account_id,
        max_questions,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ExamCreatedResponse { exam_id: exam.id, question_count: exam.questions.len() }),
    ))
}

async fn list_exams(
    CurrentUser(caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let exams = state.catalog().list_exams().await?;
    Ok(Json(render_exam_list(&exams, caller.audience(), primitive_now_utc())))
}

async fn list_upcoming_exams(
    CurrentUser(caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let now = primitive_now_utc();
    let exams = state.catalog().list_exams().await?;
    let upcoming = exams.iter().filter(|exam| !exam.has_started(now));
    Ok(Json(render_exam_list(upcoming, caller.audience(), now)))
}

async fn list_past_exams(
    CurrentUser(caller): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let now = primitive_now_utc();
    let exams = state.catalog().list_exams().await?;
    let past = exams.iter().filter(|exam| exam.has_ended(now));
    Ok(Json(render_exam_list(past, caller.audience(), now)))
}

async fn get_exam(
    CurrentUser(caller): CurrentUser,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamView>, ApiError> {
    let exam = state
        .catalog()
        .find_exam(&exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let view = render_exam_view(state.catalog(), &exam, &caller, primitive_now_utc()).await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests;
