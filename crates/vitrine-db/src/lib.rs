//! Vitrine database repositories
//!
//! Each repository owns the SQL for one aggregate. Handlers never issue
//! queries directly; they go through these types, which return domain
//! models from `vitrine-core` and keep blob-store coordination (upload
//! before insert, cascade delete after) in one place.

pub mod activity;
pub mod dashboard;
pub mod favorite;
pub mod product;
pub mod user;

pub use activity::ActivityRepository;
pub use dashboard::{DashboardRepository, DashboardSummary, RecentActivity, TopFavorited};
pub use favorite::FavoriteRepository;
pub use product::{ImageUpload, ProductRepository};
pub use user::UserRepository;
