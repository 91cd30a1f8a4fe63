use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product category enum (fixed set, mirrors the `product_category` DB type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "product_category")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[sqlx(rename = "BLOUSE")]
    Blouse,
    #[sqlx(rename = "SAREE_DESIGNER_WORK")]
    SareeDesignerWork,
    #[sqlx(rename = "LEHANGA")]
    Lehanga,
    #[sqlx(rename = "BRIDAL_CUSTOMIZATION")]
    BridalCustomization,
    #[sqlx(rename = "CUSTOM_STITCHING")]
    CustomStitching,
}

/// Product availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Sold,
}

/// Product record as stored. `image_ids` reference assets in the blob store;
/// insertion order is gallery display order.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_ids: Vec<Uuid>,
    pub price: Decimal,
    pub discount_percent: i32,
    pub category: Category,
    pub status: ProductStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for product creation. Image payloads travel separately; the
/// repository uploads them and fills `image_ids` in upload order.
#[derive(Debug, Clone, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 0, max = 100, message = "discount must be between 0 and 100"))]
    pub discount_percent: i32,
    pub category: Category,
    pub created_by: Uuid,
}

/// Partial update for a product. Every field is applied only when present;
/// `Some(0)` for the discount is a real update, not an absent field.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_percent: Option<i32>,
    pub category: Option<Category>,
    pub status: Option<ProductStatus>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.discount_percent.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }
}

/// Conjunctive listing filter. `status: None` means "no status constraint";
/// the public handler substitutes `Some(Available)` before it gets here.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub status: Option<ProductStatus>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
}

/// Derive the public URL for a stored image.
///
/// Used for every `imageUrls` entry on every read path; never persisted.
pub fn image_url(base_url: &str, asset_id: Uuid) -> String {
    format!("{}/images/{}", base_url.trim_end_matches('/'), asset_id)
}

/// Product as returned to API callers, with derived `imageUrls`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_ids: Vec<Uuid>,
    pub image_urls: Vec<String>,
    pub price: Decimal,
    pub discount_percent: i32,
    pub category: Category,
    pub status: ProductStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn from_product(product: Product, base_url: &str) -> Self {
        let image_urls = product
            .image_ids
            .iter()
            .map(|id| image_url(base_url, *id))
            .collect();
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            image_ids: product.image_ids,
            image_urls,
            price: product.price,
            discount_percent: product.discount_percent,
            category: product.category,
            status: product.status,
            created_by: product.created_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            title: "Silk saree".to_string(),
            description: "Handwoven".to_string(),
            image_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            price: Decimal::new(100_000, 2),
            discount_percent: 0,
            category: Category::SareeDesignerWork,
            status: ProductStatus::Available,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_image_url_derivation() {
        let id = Uuid::nil();
        assert_eq!(
            image_url("http://localhost:4000", id),
            format!("http://localhost:4000/images/{}", id)
        );
        // Trailing slash must not produce a double slash
        assert_eq!(
            image_url("http://localhost:4000/", id),
            format!("http://localhost:4000/images/{}", id)
        );
    }

    #[test]
    fn test_response_preserves_image_order() {
        let product = sample_product();
        let ids = product.image_ids.clone();
        let response = ProductResponse::from_product(product, "http://localhost:4000");
        assert_eq!(response.image_ids, ids);
        let expected: Vec<String> = ids
            .iter()
            .map(|id| format!("http://localhost:4000/images/{}", id))
            .collect();
        assert_eq!(response.image_urls, expected);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = ProductResponse::from_product(sample_product(), "http://localhost:4000");
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("imageUrls").is_some());
        assert!(json.get("discountPercent").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("image_urls").is_none());
        assert_eq!(
            json.get("category").and_then(|v| v.as_str()),
            Some("SAREE_DESIGNER_WORK")
        );
        assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("available"));
    }

    #[test]
    fn test_new_product_discount_range() {
        let mut new = NewProduct {
            title: "Blouse".to_string(),
            description: "Cotton".to_string(),
            price: Decimal::new(4_999, 2),
            discount_percent: 0,
            category: Category::Blouse,
            created_by: Uuid::new_v4(),
        };
        assert!(new.validate().is_ok());
        new.discount_percent = 101;
        assert!(new.validate().is_err());
        new.discount_percent = -1;
        assert!(new.validate().is_err());
        new.discount_percent = 100;
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_patch_presence_semantics() {
        let patch = ProductPatch {
            discount_percent: Some(0),
            ..Default::default()
        };
        // A zero discount is present, not absent
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());
    }
}
