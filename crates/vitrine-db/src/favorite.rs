use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use vitrine_core::models::{ActivityType, Favorite, Product};
use vitrine_core::AppError;

/// Favorite repository
///
/// A favorite is a unique (user, product) edge. The toggle is written so
/// that two concurrent toggles on the same missing edge produce exactly one
/// row and one ledger entry; the loser observes the winner's insert through
/// the unique constraint and reports the same outcome.
#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a favorite. Returns the state after the call: `true` if the
    /// product is now favorited, `false` if the favorite was removed.
    #[tracing::instrument(skip(self), fields(db.table = "favorites", db.operation = "toggle"))]
    pub async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query(
            "DELETE FROM favorites WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        let product_exists = sqlx::query("SELECT 1 AS one FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !product_exists {
            return Err(AppError::NotFound("Product not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO favorites (id, user_id, product_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        // The ledger entry rides in the same transaction and only when this
        // call actually created the edge. A concurrent winner already wrote
        // its own entry.
        if inserted.rows_affected() > 0 {
            sqlx::query(
                r#"
                INSERT INTO activities (id, user_id, product_id, activity_type, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(product_id)
            .bind(ActivityType::FavoriteProduct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn get(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Favorite>, AppError> {
        let favorite = sqlx::query_as::<Postgres, Favorite>(
            "SELECT * FROM favorites WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(favorite)
    }

    pub async fn is_favorited(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, AppError> {
        Ok(self.get(user_id, product_id).await?.is_some())
    }

    /// Products the user has favorited, most recently favorited first.
    /// Products deleted since being favorited simply no longer appear.
    pub async fn products_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM favorites f
            JOIN products p ON p.id = f.product_id
            WHERE f.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let products = sqlx::query_as::<Postgres, Product>(
            r#"
            SELECT p.*
            FROM favorites f
            JOIN products p ON p.id = f.product_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((products, total))
    }
}
