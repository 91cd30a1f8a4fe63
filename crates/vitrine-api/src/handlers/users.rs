use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use serde::Serialize;
use utoipa::ToSchema;

use vitrine_core::models::{ActivityResponse, UserResponse};

use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::PageParams;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::state::AppState;

/// User profile plus lightweight engagement counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub total_favorites: i64,
    pub total_activities: i64,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user's profile", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProfileResponse>>, HttpAppError> {
    let user = state.users.get(identity.user_id).await?;
    let total_favorites = state.favorites.count_for_user(identity.user_id).await?;
    let total_activities = state.activities.count_for_user(identity.user_id).await?;

    Ok(Json(ApiResponse::new(ProfileResponse {
        user: UserResponse::from(user),
        total_favorites,
        total_activities,
    })))
}

#[utoipa::path(
    get,
    path = "/api/users/activities",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "The authenticated user's activity history, newest first", body = PaginatedResponse<ActivityResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_activities(
    identity: Identity,
    Query(params): Query<PageParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<ActivityResponse>>, HttpAppError> {
    let (page, limit) = (params.page(), params.limit());
    let (activities, total) = state
        .activities
        .list_for_user(identity.user_id, page, limit)
        .await?;

    let data = activities.into_iter().map(ActivityResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
