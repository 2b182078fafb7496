use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStaff;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::schemas::question::{
    QuestionCreate, QuestionListQuery, QuestionResponse, QuestionUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_questions).post(create_question)).route(
        "/:question_id",
        get(get_question).patch(update_question).delete(delete_question),
    )
}

async fn list_questions(
    CurrentStaff(_caller): CurrentStaff,
    State(state): State<AppState>,
    Query(filter): Query<QuestionListQuery>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<QuestionResponse>>, ApiError> {
    let page = paging.page();
    let (questions, total_count) =
        state.bank().list_questions(filter.theme_id.as_deref(), page).await?;

    Ok(Json(PaginatedResponse {
        items: questions.into_iter().map(QuestionResponse::from).collect(),
        total_count,
        skip: page.skip,
        limit: page.limit,
    }))
}

async fn get_question(
    CurrentStaff(_caller): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = state
        .bank()
        .find_question(&question_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    Ok(Json(question.into()))
}

async fn create_question(
    CurrentStaff(caller): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if state.bank().find_theme(&payload.theme_id).await?.is_none() {
        return Err(ApiError::NotFound("Theme not found".to_string()));
    }

    let question = state.bank().create_question(payload.into()).await?;
    tracing::info!(
        question_id = %question.id,
        theme_id = %question.theme_id,
        created_by = %caller.account_id,
        "Question created"
    );

    Ok((StatusCode::CREATED, Json(question.into())))
}

async fn update_question(
    CurrentStaff(_caller): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = state
        .bank()
        .update_question(&question_id, payload.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    Ok(Json(question.into()))
}

async fn delete_question(
    CurrentStaff(caller): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.bank().delete_question(&question_id).await? {
        Some(_) => {
            tracing::info!(
                question_id = %question_id,
                deleted_by = %caller.account_id,
                "Question deleted"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Question not found".to_string())),
    }
}
