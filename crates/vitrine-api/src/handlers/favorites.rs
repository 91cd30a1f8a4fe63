use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use vitrine_core::models::ProductResponse;

use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::PageParams;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteResult {
    pub product_id: Uuid,
    pub favorited: bool,
}

#[utoipa::path(
    post,
    path = "/api/favorites/{productId}/toggle",
    tag = "favorites",
    params(
        ("productId" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Favorite toggled", body = ApiResponse<ToggleFavoriteResult>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_favorite(
    identity: Identity,
    Path(product_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ToggleFavoriteResult>>, HttpAppError> {
    let favorited = state
        .favorites
        .toggle(identity.user_id, product_id)
        .await?;

    Ok(Json(ApiResponse::new(ToggleFavoriteResult {
        product_id,
        favorited,
    })))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{productId}/check",
    tag = "favorites",
    params(
        ("productId" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Whether the caller has favorited this product", body = ApiResponse<ToggleFavoriteResult>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_favorite(
    identity: Identity,
    Path(product_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ToggleFavoriteResult>>, HttpAppError> {
    let favorited = state
        .favorites
        .is_favorited(identity.user_id, product_id)
        .await?;

    Ok(Json(ApiResponse::new(ToggleFavoriteResult {
        product_id,
        favorited,
    })))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    tag = "favorites",
    params(PageParams),
    responses(
        (status = 200, description = "Favorited products, most recently favorited first", body = PaginatedResponse<ProductResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_favorites(
    identity: Identity,
    Query(params): Query<PageParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<ProductResponse>>, HttpAppError> {
    let (page, limit) = (params.page(), params.limit());
    let (products, total) = state
        .favorites
        .products_for_user(identity.user_id, page, limit)
        .await?;

    let base_url = &state.config.public_base_url;
    let data = products
        .into_iter()
        .map(|p| ProductResponse::from_product(p, base_url))
        .collect();

    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
