//! Core domain types for the Vitrine catalog service.
//!
//! This crate holds the entity models (products, favorites, activities,
//! users), the unified error taxonomy, and the service configuration. It
//! knows nothing about HTTP or about how blobs are chunked; those concerns
//! live in `vitrine-api` and `vitrine-storage`.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
