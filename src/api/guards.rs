use std::collections::BTreeSet;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::types::Role;
use crate::services::exam_access::{Audience, Caller};

/// Any caller holding a valid access token, whatever its roles.
pub(crate) struct CurrentUser(pub(crate) Caller);
/// A caller served as admin or teacher.
pub(crate) struct CurrentStaff(pub(crate) Caller);
pub(crate) struct CurrentAdmin(pub(crate) Caller);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let roles: BTreeSet<Role> =
            claims.roles.iter().filter_map(|role| Role::parse(role)).collect();
        if roles.len() < claims.roles.len() {
            tracing::debug!(account_id = %claims.sub, "Ignoring unknown roles in access token");
        }

        Ok(CurrentUser(Caller { account_id: claims.sub, roles }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(caller) = CurrentUser::from_request_parts(parts, state).await?;

        if caller.audience().is_staff() {
            Ok(CurrentStaff(caller))
        } else {
            Err(ApiError::Forbidden("Teacher or admin role required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(caller) = CurrentUser::from_request_parts(parts, state).await?;

        if caller.audience() == Audience::Admin {
            Ok(CurrentAdmin(caller))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}
