use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A (user, product) favorite edge. At most one row per pair; the database
/// enforces uniqueness so concurrent toggles cannot create duplicates.
#[derive(Debug, Clone, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}
