//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::response;
use vitrine_core::models;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vitrine API",
        version = "0.1.0",
        description = "Boutique catalog API: products with chunked image storage, favorites, an activity ledger, and an admin dashboard."
    ),
    paths(
        // Products
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::set_status,
        handlers::products::set_discount,
        // Favorites
        handlers::favorites::toggle_favorite,
        handlers::favorites::check_favorite,
        handlers::favorites::list_favorites,
        // Users
        handlers::users::me,
        handlers::users::my_activities,
        // Admin
        handlers::admin::dashboard,
        handlers::admin::list_products,
        handlers::admin::list_users,
        handlers::admin::list_activities,
        // Images
        handlers::images::serve_image,
        // Health
        handlers::health::health,
    ),
    components(
        schemas(
            // Core models
            models::ProductResponse,
            models::Category,
            models::ProductStatus,
            models::ActivityResponse,
            models::ActivityType,
            models::UserResponse,
            models::UserRole,
            // Handler models
            handlers::products::SetStatusRequest,
            handlers::products::SetDiscountRequest,
            handlers::favorites::ToggleFavoriteResult,
            handlers::users::ProfileResponse,
            handlers::admin::DashboardResponse,
            handlers::admin::DashboardTotals,
            handlers::admin::TopFavoritedEntry,
            handlers::admin::RecentActivityEntry,
            handlers::health::HealthResponse,
            // Envelopes
            response::ApiMessage,
            response::Pagination,
            // Error
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "products", description = "Catalog browsing and admin product management"),
        (name = "favorites", description = "Per-user favorite toggling and listing"),
        (name = "users", description = "Authenticated user profile and activity history"),
        (name = "admin", description = "Admin dashboard and management listings"),
        (name = "images", description = "Public image serving from the blob store"),
        (name = "health", description = "Service health checks")
    )
)]
pub struct ApiDoc;
