pub mod activity;
pub mod favorite;
pub mod product;
pub mod user;

pub use activity::{Activity, ActivityResponse, ActivityType};
pub use favorite::Favorite;
pub use product::{
    image_url, Category, NewProduct, Product, ProductFilter, ProductPatch, ProductResponse,
    ProductStatus,
};
pub use user::{User, UserResponse, UserRole};
