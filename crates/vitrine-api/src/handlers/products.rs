use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use vitrine_core::models::{
    ActivityType, Category, NewProduct, ProductFilter, ProductPatch, ProductResponse,
    ProductStatus,
};
use vitrine_core::AppError;
use vitrine_db::ImageUpload;

use crate::auth::{AdminIdentity, OptionalIdentity};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::PageParams;
use crate::response::{ApiMessage, ApiResponse, PaginatedResponse};
use crate::state::AppState;

/// Listing filters. All filters are optional and conjunctive.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<Category>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

impl ProductListParams {
    pub fn pagination(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category,
            status: self.status,
            price_min: self.min_price,
            price_max: self.max_price,
            search: self.search.clone(),
        }
    }
}

/// Accumulated multipart form for product create and update.
#[derive(Default)]
struct ProductForm {
    title: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    discount_percent: Option<i32>,
    category: Option<Category>,
    status: Option<ProductStatus>,
    remove_image_ids: Vec<Uuid>,
    images: Vec<ImageUpload>,
}

fn parse_enum_field<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| AppError::InvalidInput(format!("Invalid {}: {}", what, raw)))
}

async fn parse_product_form(
    mut multipart: Multipart,
    state: &AppState,
) -> Result<ProductForm, AppError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "images" => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !content_type.starts_with("image/") {
                    return Err(AppError::InvalidInput(format!(
                        "Only image uploads are accepted, got {}",
                        content_type
                    )));
                }
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read image field: {}", e))
                })?;
                if data.len() > state.config.max_image_size_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Image {} exceeds the {} byte limit",
                        filename, state.config.max_image_size_bytes
                    )));
                }
                form.images.push(ImageUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            other => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read field {}: {}", other, e))
                })?;
                match other {
                    "title" => form.title = Some(text),
                    "description" => form.description = Some(text),
                    "price" => {
                        form.price = Some(text.trim().parse().map_err(|_| {
                            AppError::InvalidInput(format!("Invalid price: {}", text))
                        })?)
                    }
                    "discountPercent" => {
                        form.discount_percent = Some(text.trim().parse().map_err(|_| {
                            AppError::InvalidInput(format!("Invalid discount: {}", text))
                        })?)
                    }
                    "category" => form.category = Some(parse_enum_field(&text, "category")?),
                    "status" => form.status = Some(parse_enum_field(&text, "status")?),
                    "removeImageIds" => {
                        form.remove_image_ids = serde_json::from_str(&text).map_err(|_| {
                            AppError::InvalidInput(
                                "removeImageIds must be a JSON array of UUIDs".to_string(),
                            )
                        })?
                    }
                    _ => {}
                }
            }
        }
    }

    if form.images.len() > state.config.max_images_per_product {
        return Err(AppError::InvalidInput(format!(
            "At most {} images per product",
            state.config.max_images_per_product
        )));
    }

    Ok(form)
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ProductListParams),
    responses(
        (status = 200, description = "Available products, newest first", body = PaginatedResponse<ProductResponse>)
    )
)]
pub async fn list_products(
    Query(params): Query<ProductListParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PaginatedResponse<ProductResponse>>, HttpAppError> {
    let pagination = params.pagination();
    let (page, limit) = (pagination.page(), pagination.limit());

    // The public listing hides sold items unless the caller asks for them.
    let mut filter = params.filter();
    if filter.status.is_none() {
        filter.status = Some(ProductStatus::Available);
    }

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
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn get_product(
    identity: OptionalIdentity,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProductResponse>>, HttpAppError> {
    let product = state.products.get(id).await?;

    // Views by authenticated shoppers land in the ledger; admin and
    // anonymous reads do not. A ledger write failure must not fail the read.
    if let OptionalIdentity(Some(identity)) = identity {
        if !identity.role.is_admin() {
            if let Err(e) = state
                .activities
                .record(identity.user_id, id, ActivityType::ViewProduct)
                .await
            {
                tracing::warn!(error = %e, product_id = %id, "Failed to record view activity");
            }
        }
    }

    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product,
        &state.config.public_base_url,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    AdminIdentity(identity): AdminIdentity,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(http::StatusCode, Json<ApiResponse<ProductResponse>>), HttpAppError> {
    let form = parse_product_form(multipart, &state).await?;

    let title = form
        .title
        .ok_or_else(|| AppError::InvalidInput("title is required".to_string()))?;
    let description = form
        .description
        .ok_or_else(|| AppError::InvalidInput("description is required".to_string()))?;
    let price = form
        .price
        .ok_or_else(|| AppError::InvalidInput("price is required".to_string()))?;
    let category = form
        .category
        .ok_or_else(|| AppError::InvalidInput("category is required".to_string()))?;
    if form.images.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "At least one image is required".to_string(),
        )));
    }

    let new = NewProduct {
        title,
        description,
        price,
        discount_percent: form.discount_percent.unwrap_or(0),
        category,
        created_by: identity.user_id,
    };

    let product = state.products.create(new, form.images).await?;

    Ok((
        http::StatusCode::CREATED,
        Json(ApiResponse::new(ProductResponse::from_product(
            product,
            &state.config.public_base_url,
        ))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    AdminIdentity(_identity): AdminIdentity,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProductResponse>>, HttpAppError> {
    let form = parse_product_form(multipart, &state).await?;

    let patch = ProductPatch {
        title: form.title,
        description: form.description,
        price: form.price,
        discount_percent: form.discount_percent,
        category: form.category,
        status: form.status,
    };

    let product = state
        .products
        .update(id, &form.remove_image_ids, form.images, patch)
        .await?;

    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product,
        &state.config.public_base_url,
    ))))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetStatusRequest {
    pub status: ProductStatus,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscountRequest {
    pub discount_percent: i32,
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/status",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ProductResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_status(
    AdminIdentity(_identity): AdminIdentity,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, HttpAppError> {
    let patch = ProductPatch {
        status: Some(body.status),
        ..Default::default()
    };
    let product = state.products.update(id, &[], Vec::new(), patch).await?;
    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product,
        &state.config.public_base_url,
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/discount",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetDiscountRequest,
    responses(
        (status = 200, description = "Discount updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Discount out of range", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_discount(
    AdminIdentity(_identity): AdminIdentity,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetDiscountRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, HttpAppError> {
    let patch = ProductPatch {
        discount_percent: Some(body.discount_percent),
        ..Default::default()
    };
    let product = state.products.update(id, &[], Vec::new(), patch).await?;
    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product,
        &state.config.public_base_url,
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiMessage),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    AdminIdentity(_identity): AdminIdentity,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiMessage>, HttpAppError> {
    state.products.delete(id).await?;
    Ok(Json(ApiMessage::new("Product deleted")))
}
