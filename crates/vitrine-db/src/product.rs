use std::sync::Arc;

use bytes::Bytes;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use vitrine_core::models::{NewProduct, Product, ProductFilter, ProductPatch};
use vitrine_core::AppError;
use vitrine_storage::BlobStore;

/// An image payload received alongside a product create or update.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Product repository
///
/// Coordinates catalog rows with the blob store. Image bytes are uploaded
/// before the product row is written; on a failed insert the freshly
/// uploaded assets are cleaned up so no orphans accumulate.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
    storage: Arc<dyn BlobStore>,
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Recompute a product's gallery: surviving existing ids in their original
/// order, then freshly uploaded ids appended. Removal ids not attached to
/// the product are ignored.
fn recompute_image_ids(existing: &[Uuid], removals: &[Uuid], appended: &[Uuid]) -> Vec<Uuid> {
    existing
        .iter()
        .filter(|id| !removals.contains(id))
        .chain(appended.iter())
        .copied()
        .collect()
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(price_min) = filter.price_min {
        builder.push(" AND price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        builder.push(" AND price <= ").push_bind(price_max);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl ProductRepository {
    pub fn new(pool: PgPool, storage: Arc<dyn BlobStore>) -> Self {
        Self { pool, storage }
    }

    /// Delete assets, logging failures instead of propagating them. Used
    /// where asset cleanup must not mask the error that triggered it.
    async fn delete_assets_best_effort(&self, asset_ids: &[Uuid]) {
        for asset_id in asset_ids {
            if let Err(e) = self.storage.delete(*asset_id).await {
                warn!(asset_id = %asset_id, error = %e, "Failed to delete image asset");
            }
        }
    }

    /// Upload a batch of images, returning the new asset ids in order. If
    /// one upload fails the ones before it are deleted again.
    async fn upload_images(&self, images: Vec<ImageUpload>) -> Result<Vec<Uuid>, AppError> {
        let mut asset_ids = Vec::with_capacity(images.len());
        for image in images {
            match self
                .storage
                .put(&image.filename, &image.content_type, image.data)
                .await
            {
                Ok(asset_id) => asset_ids.push(asset_id),
                Err(e) => {
                    self.delete_assets_best_effort(&asset_ids).await;
                    return Err(AppError::Storage(e.to_string()));
                }
            }
        }
        Ok(asset_ids)
    }

    /// List products matching the filter, newest first, with the total
    /// match count for pagination.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let offset = (page - 1) * limit;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        push_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok((products, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        sqlx::query_as::<Postgres, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    /// Create a product. Images are uploaded first; the resulting asset ids
    /// become `image_ids` in upload order. If the insert fails the uploaded
    /// assets are deleted again.
    #[tracing::instrument(skip(self, new, images), fields(db.table = "products", db.operation = "insert"))]
    pub async fn create(
        &self,
        new: NewProduct,
        images: Vec<ImageUpload>,
    ) -> Result<Product, AppError> {
        new.validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let image_ids = self.upload_images(images).await?;

        let result = sqlx::query_as::<Postgres, Product>(
            r#"
            INSERT INTO products (
                id, title, description, image_ids, price, discount_percent,
                category, status, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'available', $8, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&image_ids)
        .bind(new.price)
        .bind(new.discount_percent)
        .bind(new.category)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(product) => Ok(product),
            Err(e) => {
                // Don't leave orphaned assets behind a failed insert.
                self.delete_assets_best_effort(&image_ids).await;
                Err(e.into())
            }
        }
    }

    /// Update a product: removals are applied first, then new uploads are
    /// appended, then scalar fields are patched, all reflected in a single
    /// row update.
    #[tracing::instrument(skip(self, remove_image_ids, new_images, patch), fields(db.table = "products", db.operation = "update"))]
    pub async fn update(
        &self,
        id: Uuid,
        remove_image_ids: &[Uuid],
        new_images: Vec<ImageUpload>,
        patch: ProductPatch,
    ) -> Result<Product, AppError> {
        if let Some(discount) = patch.discount_percent {
            if !(0..=100).contains(&discount) {
                return Err(AppError::InvalidInput(
                    "Discount must be between 0 and 100".to_string(),
                ));
            }
        }
        if patch.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(AppError::InvalidInput(
                "Price cannot be negative".to_string(),
            ));
        }

        let product = self.get(id).await?;

        // Removals first. Ids not attached to this product are ignored.
        for asset_id in remove_image_ids {
            if !product.image_ids.contains(asset_id) {
                continue;
            }
            if let Err(e) = self.storage.delete(*asset_id).await {
                warn!(asset_id = %asset_id, error = %e, "Failed to delete removed image asset");
            }
        }

        // New uploads append after surviving images.
        let appended = self.upload_images(new_images).await?;
        let image_ids = recompute_image_ids(&product.image_ids, remove_image_ids, &appended);

        let result = sqlx::query_as::<Postgres, Product>(
            r#"
            UPDATE products SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                discount_percent = COALESCE($5, discount_percent),
                category = COALESCE($6, category),
                status = COALESCE($7, status),
                image_ids = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.discount_percent)
        .bind(patch.category)
        .bind(patch.status)
        .bind(&image_ids)
        .fetch_optional(&self.pool)
        .await;

        // A failed or vanished row must not strand the fresh uploads.
        match result {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => {
                self.delete_assets_best_effort(&appended).await;
                Err(AppError::NotFound("Product not found".to_string()))
            }
            Err(e) => {
                self.delete_assets_best_effort(&appended).await;
                Err(e.into())
            }
        }
    }

    /// Delete a product and its image assets. The catalog row goes first;
    /// asset cleanup is best effort and never fails the deletion.
    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "delete"))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let row = sqlx::query_as::<Postgres, Product>(
            "DELETE FROM products WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        for asset_id in row.image_ids {
            if let Err(e) = self.storage.delete(asset_id).await {
                warn!(asset_id = %asset_id, product_id = %id, error = %e,
                    "Failed to delete image asset for removed product");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use vitrine_core::models::{Category, ProductStatus};
    use vitrine_storage::{AssetInfo, BlobStream, StorageError, StorageResult};

    /// In-memory store that records deletes and can be told to fail
    /// specific operations.
    #[derive(Default)]
    struct FlakyStore {
        fail_put_on: Option<&'static str>,
        fail_delete_on: Option<Uuid>,
        stored: Mutex<Vec<Uuid>>,
        deleted: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn put(
            &self,
            filename: &str,
            _content_type: &str,
            _data: Bytes,
        ) -> StorageResult<Uuid> {
            if self.fail_put_on == Some(filename) {
                return Err(StorageError::UploadFailed("backend unavailable".to_string()));
            }
            let id = Uuid::new_v4();
            self.stored.lock().unwrap().push(id);
            Ok(id)
        }

        async fn head(&self, id: Uuid) -> StorageResult<AssetInfo> {
            Err(StorageError::NotFound(id))
        }

        async fn stream(&self, id: Uuid) -> StorageResult<(AssetInfo, BlobStream)> {
            Err(StorageError::NotFound(id))
        }

        async fn delete(&self, id: Uuid) -> StorageResult<()> {
            if self.fail_delete_on == Some(id) {
                return Err(StorageError::DeleteFailed("backend unavailable".to_string()));
            }
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    fn test_repo(storage: Arc<dyn BlobStore>) -> ProductRepository {
        let pool = PgPool::connect_lazy("postgresql://localhost/vitrine_test").unwrap();
        ProductRepository::new(pool, storage)
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"bytes"),
        }
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_recompute_image_ids_replaces_single_image() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        assert_eq!(recompute_image_ids(&[old], &[old], &[new]), vec![new]);
    }

    #[test]
    fn test_recompute_image_ids_keeps_order_and_appends() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let new = Uuid::new_v4();
        assert_eq!(
            recompute_image_ids(&ids, &[ids[1]], &[new]),
            vec![ids[0], ids[2], new]
        );
    }

    #[test]
    fn test_recompute_image_ids_ignores_unknown_removals() {
        let id = Uuid::new_v4();
        assert_eq!(recompute_image_ids(&[id], &[Uuid::new_v4()], &[]), vec![id]);
    }

    #[tokio::test]
    async fn test_failed_upload_rolls_back_earlier_uploads() {
        let store = Arc::new(FlakyStore {
            fail_put_on: Some("bad.jpg"),
            ..Default::default()
        });
        let repo = test_repo(store.clone());

        let err = repo
            .upload_images(vec![image("a.jpg"), image("b.jpg"), image("bad.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let stored = store.stored.lock().unwrap().clone();
        let deleted = store.deleted.lock().unwrap().clone();
        assert_eq!(stored.len(), 2);
        assert_eq!(deleted, stored);
    }

    #[tokio::test]
    async fn test_cleanup_continues_past_delete_failures() {
        let first = Uuid::new_v4();
        let failing = Uuid::new_v4();
        let last = Uuid::new_v4();
        let store = Arc::new(FlakyStore {
            fail_delete_on: Some(failing),
            ..Default::default()
        });
        let repo = test_repo(store.clone());

        repo.delete_assets_best_effort(&[first, failing, last]).await;

        assert_eq!(*store.deleted.lock().unwrap(), vec![first, last]);
    }

    #[test]
    fn test_push_filter_empty_is_noop() {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        push_filter(&mut builder, &ProductFilter::default());
        assert_eq!(builder.sql(), "SELECT * FROM products WHERE 1=1");
    }

    #[test]
    fn test_push_filter_binds_in_order() {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        let filter = ProductFilter {
            category: Some(Category::Lehanga),
            status: Some(ProductStatus::Available),
            price_min: Some(Decimal::new(500, 0)),
            price_max: Some(Decimal::new(5000, 0)),
            search: Some("silk".to_string()),
        };
        push_filter(&mut builder, &filter);
        let sql = builder.sql();
        assert!(sql.contains("category = $1"));
        assert!(sql.contains("status = $2"));
        assert!(sql.contains("price >= $3"));
        assert!(sql.contains("price <= $4"));
        assert!(sql.contains("title ILIKE $5"));
        assert!(sql.contains("description ILIKE $6"));
    }

    #[test]
    fn test_push_filter_skips_absent_fields() {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        let filter = ProductFilter {
            search: Some("bridal".to_string()),
            ..Default::default()
        };
        push_filter(&mut builder, &filter);
        let sql = builder.sql();
        assert!(!sql.contains("category"));
        assert!(!sql.contains("status"));
        assert!(sql.contains("title ILIKE $1"));
    }
}
