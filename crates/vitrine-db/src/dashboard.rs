use std::collections::HashMap;

use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use vitrine_core::models::{Activity, Product, User};
use vitrine_core::AppError;

const TOP_FAVORITED_LIMIT: i64 = 10;
const RECENT_ACTIVITIES_LIMIT: i64 = 20;

/// A product together with how many users have favorited it.
#[derive(Debug, Clone, FromRow)]
pub struct TopFavorited {
    #[sqlx(flatten)]
    pub product: Product,
    pub favorite_count: i64,
}

/// A ledger entry joined with whatever still exists of its user and
/// product. Either side may be gone; the entry itself never is.
#[derive(Debug, Clone)]
pub struct RecentActivity {
    pub activity: Activity,
    pub user: Option<User>,
    pub product: Option<Product>,
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub total_products: i64,
    pub total_users: i64,
    pub total_favorites: i64,
    pub total_activities: i64,
    pub top_favorited: Vec<TopFavorited>,
    pub recent_activities: Vec<RecentActivity>,
}

/// Read-only aggregation over the other repositories' tables, backing the
/// admin dashboard.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, AppError> {
        let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_favorites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
            .fetch_one(&self.pool)
            .await?;
        let total_activities: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.pool)
            .await?;

        let top_favorited = self.top_favorited().await?;
        let recent_activities = self.recent_activities().await?;

        Ok(DashboardSummary {
            total_products,
            total_users,
            total_favorites,
            total_activities,
            top_favorited,
            recent_activities,
        })
    }

    /// Most-favorited products, ties broken by product id so the ordering
    /// is stable across refreshes. Products with zero favorites are
    /// excluded.
    async fn top_favorited(&self) -> Result<Vec<TopFavorited>, AppError> {
        let rows = sqlx::query_as::<Postgres, TopFavorited>(
            r#"
            SELECT p.*, COUNT(f.id) AS favorite_count
            FROM favorites f
            JOIN products p ON p.id = f.product_id
            GROUP BY p.id
            ORDER BY favorite_count DESC, p.id ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_FAVORITED_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Latest ledger entries enriched with user and product records in two
    /// batch lookups, not one query per entry.
    async fn recent_activities(&self) -> Result<Vec<RecentActivity>, AppError> {
        let activities = sqlx::query_as::<Postgres, Activity>(
            "SELECT * FROM activities ORDER BY created_at DESC LIMIT $1",
        )
        .bind(RECENT_ACTIVITIES_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let user_ids: Vec<Uuid> = activities.iter().map(|a| a.user_id).collect();
        let product_ids: Vec<Uuid> = activities.iter().map(|a| a.product_id).collect();

        let users: HashMap<Uuid, User> = sqlx::query_as::<Postgres, User>(
            "SELECT * FROM users WHERE id = ANY($1)",
        )
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

        let products: HashMap<Uuid, Product> = sqlx::query_as::<Postgres, Product>(
            "SELECT * FROM products WHERE id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        Ok(activities
            .into_iter()
            .map(|activity| {
                let user = users.get(&activity.user_id).cloned();
                let product = products.get(&activity.product_id).cloned();
                RecentActivity {
                    activity,
                    user,
                    product,
                }
            })
            .collect())
    }
}
