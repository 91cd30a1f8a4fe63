use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use vitrine_core::models::{ActivityResponse, ProductResponse, UserResponse};
use vitrine_db::{DashboardSummary, RecentActivity, TopFavorited};

use crate::auth::AdminIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::products::ProductListParams;
use crate::handlers::PageParams;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardTotals {
    pub products: i64,
    pub users: i64,
    pub favorites: i64,
    pub activities: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopFavoritedEntry {
    pub product: ProductResponse,
    pub favorite_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityEntry {
    pub activity: ActivityResponse,
    /// Absent when the user record no longer exists.
    pub user: Option<UserResponse>,
    /// Absent when the product has been deleted since the activity.
    pub product: Option<ProductResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub totals: DashboardTotals,
    pub top_favorited: Vec<TopFavoritedEntry>,
    pub recent_activities: Vec<RecentActivityEntry>,
}

impl DashboardResponse {
    fn from_summary(summary: DashboardSummary, base_url: &str) -> Self {
        let top_favorited = summary
            .top_favorited
            .into_iter()
            .map(|TopFavorited { product, favorite_count }| TopFavoritedEntry {
                product: ProductResponse::from_product(product, base_url),
                favorite_count,
            })
            .collect();

        let recent_activities = summary
            .recent_activities
            .into_iter()
            .map(|RecentActivity { activity, user, product }| RecentActivityEntry {
                activity: ActivityResponse::from(activity),
                user: user.map(UserResponse::from),
                product: product.map(|p| ProductResponse::from_product(p, base_url)),
            })
            .collect();

        Self {
            totals: DashboardTotals {
                products: summary.total_products,
                users: summary.total_users,
                favorites: summary.total_favorites,
                activities: summary.total_activities,
            },
            top_favorited,
            recent_activities,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "admin",
    responses(
        (status = 200, description = "Aggregated store dashboard", body = ApiResponse<DashboardResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    AdminIdentity(_identity): AdminIdentity,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardResponse>>, HttpAppError> {
    let summary = state.dashboard.summary().await?;
    Ok(Json(ApiResponse::new(DashboardResponse::from_summary(
        summary,
        &state.config.public_base_url,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "admin",
    params(ProductListParams),
    responses(
        (status = 200, description = "All products regardless of status", body = PaginatedResponse<ProductResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_products(
    AdminIdentity(_identity): AdminIdentity,
    Query(params): Query<ProductListParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<ProductResponse>>, HttpAppError> {
    let pagination = params.pagination();
    let (page, limit) = (pagination.page(), pagination.limit());

    // No implicit status filter here; admins see sold items too.
    let filter = params.filter();
    let (products, total) = state.products.list(&filter, page, limit).await?;

    let base_url = &state.config.public_base_url;
    let data = products
        .into_iter()
        .map(|p| ProductResponse::from_product(p, base_url))
        .collect();

    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(PageParams),
    responses(
        (status = 200, description = "Registered users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    AdminIdentity(_identity): AdminIdentity,
    Query(params): Query<PageParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<UserResponse>>, HttpAppError> {
    let (page, limit) = (params.page(), params.limit());
    let (users, total) = state.users.list(page, limit).await?;

    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/api/admin/activities",
    tag = "admin",
    params(PageParams),
    responses(
        (status = 200, description = "Full activity ledger, newest first", body = PaginatedResponse<ActivityResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_activities(
    AdminIdentity(_identity): AdminIdentity,
    Query(params): Query<PageParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<ActivityResponse>>, HttpAppError> {
    let (page, limit) = (params.page(), params.limit());
    let (activities, total) = state.activities.list_all(page, limit).await?;

    let data = activities.into_iter().map(ActivityResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
