//! Blob storage abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must
//! implement.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Asset not found: {0}")]
    NotFound(Uuid),

    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of chunk payloads in ascending sequence order.
pub type BlobStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Asset metadata, readable without touching any chunk data.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetInfo {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub length: i64,
    pub chunk_size: i32,
    pub uploaded_at: DateTime<Utc>,
}

/// Blob storage abstraction trait
///
/// Assets are opaque byte sequences addressed by server-assigned UUIDs.
/// Callers never see chunk boundaries; `stream` always yields the full
/// payload in order.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and return its newly assigned id.
    ///
    /// Either the asset record and every chunk are persisted, or nothing is.
    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<Uuid>;

    /// Fetch asset metadata without reading chunk data.
    async fn head(&self, id: Uuid) -> StorageResult<AssetInfo>;

    /// Stream the blob chunk by chunk, for serving large files without
    /// buffering them whole.
    async fn stream(&self, id: Uuid) -> StorageResult<(AssetInfo, BlobStream)>;

    /// Delete an asset and all of its chunks.
    async fn delete(&self, id: Uuid) -> StorageResult<()>;
}
