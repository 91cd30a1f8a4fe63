use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of recorded user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "activity_type")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    #[sqlx(rename = "VIEW_PRODUCT")]
    ViewProduct,
    #[sqlx(rename = "FAVORITE_PRODUCT")]
    FavoriteProduct,
}

/// Append-only activity ledger entry. Entries are never updated or deleted
/// by application code, and survive deletion of the product they reference.
#[derive(Debug, Clone, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            user_id: activity.user_id,
            product_id: activity.product_id,
            activity_type: activity.activity_type,
            created_at: activity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ActivityType::ViewProduct).expect("serialize"),
            "\"VIEW_PRODUCT\""
        );
        assert_eq!(
            serde_json::from_str::<ActivityType>("\"FAVORITE_PRODUCT\"").expect("deserialize"),
            ActivityType::FavoriteProduct
        );
    }
}
