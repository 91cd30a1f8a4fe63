use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use vitrine_core::models::{Activity, ActivityType};
use vitrine_core::AppError;

/// Activity repository
///
/// The ledger is append only. Entries reference products by bare id with no
/// foreign key, so they survive product deletion.
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "activities", db.operation = "insert"))]
    pub async fn record(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        activity_type: ActivityType,
    ) -> Result<Activity, AppError> {
        let activity = sqlx::query_as::<Postgres, Activity>(
            r#"
            INSERT INTO activities (id, user_id, product_id, activity_type, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(activity_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(activity)
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Activity>, i64), AppError> {
        let offset = (page - 1) * limit;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let activities = sqlx::query_as::<Postgres, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((activities, total))
    }

    pub async fn list_all(&self, page: i64, limit: i64) -> Result<(Vec<Activity>, i64), AppError> {
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.pool)
            .await?;

        let activities = sqlx::query_as::<Postgres, Activity>(
            r#"
            SELECT * FROM activities
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((activities, total))
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<Postgres, Activity>(
            "SELECT * FROM activities ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }
}
