//! Postgres chunked blob storage implementation
//!
//! Blobs live in two tables: `assets` holds per-file metadata and
//! `asset_chunks` holds the payload split into fixed-size chunks keyed by
//! `(asset_id, seq)`. Writes are transactional; a failed upload leaves no
//! partial chunks behind.

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{PgPool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use crate::traits::{AssetInfo, BlobStore, BlobStream, StorageError, StorageResult};

/// 255 KiB. Keeps each chunk row comfortably inside a single TOAST-free
/// page fetch while bounding per-chunk memory on the streaming path.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Blob store backed by the service's own Postgres database.
#[derive(Clone)]
pub struct PgBlobStore {
    pool: PgPool,
    chunk_size: usize,
}

impl PgBlobStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(pool: PgPool, chunk_size: usize) -> Self {
        Self { pool, chunk_size }
    }
}

/// Split a payload into consecutive chunks of at most `chunk_size` bytes.
/// Only the final chunk may be shorter; an empty payload yields no chunks.
fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len().div_ceil(chunk_size.max(1)));
    let mut offset = 0;
    while offset < data.len() {
        let end = usize::min(offset + chunk_size, data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    chunks
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn put(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<Uuid> {
        let id = Uuid::new_v4();
        let length = data.len() as i64;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO assets (id, filename, content_type, length, chunk_size, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(id)
        .bind(filename)
        .bind(content_type)
        .bind(length)
        .bind(self.chunk_size as i32)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        for (seq, chunk) in split_chunks(&data, self.chunk_size).into_iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO asset_chunks (asset_id, seq, data)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(id)
            .bind(seq as i32)
            .bind(chunk.as_ref())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        debug!(asset_id = %id, filename = filename, length = length, "Stored blob");
        Ok(id)
    }

    async fn head(&self, id: Uuid) -> StorageResult<AssetInfo> {
        sqlx::query_as::<Postgres, AssetInfo>(
            r#"
            SELECT id, filename, content_type, length, chunk_size, uploaded_at
            FROM assets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::BackendError(e.to_string()))?
        .ok_or(StorageError::NotFound(id))
    }

    async fn stream(&self, id: Uuid) -> StorageResult<(AssetInfo, BlobStream)> {
        let info = self.head(id).await?;
        let pool = self.pool.clone();

        // One chunk per query, in seq order. The pool is owned by the
        // stream so it outlives this call.
        let stream = futures::stream::unfold(
            (pool, id, 0i32, false),
            |(pool, asset_id, seq, done)| async move {
                if done {
                    return None;
                }
                let row = sqlx::query(
                    r#"
                    SELECT data FROM asset_chunks
                    WHERE asset_id = $1 AND seq = $2
                    "#,
                )
                .bind(asset_id)
                .bind(seq)
                .fetch_optional(&pool)
                .await;

                match row {
                    Ok(Some(row)) => {
                        let data: Vec<u8> = row.get("data");
                        Some((Ok(Bytes::from(data)), (pool, asset_id, seq + 1, false)))
                    }
                    Ok(None) => None,
                    Err(e) => Some((
                        Err(StorageError::DownloadFailed(e.to_string())),
                        (pool, asset_id, seq, true),
                    )),
                }
            },
        );

        Ok((info, Box::pin(stream)))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<()> {
        // asset_chunks rows cascade from the asset row.
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id));
        }

        debug!(asset_id = %id, "Deleted blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks_exact_multiple() {
        let data = Bytes::from(vec![7u8; 1024]);
        let chunks = split_chunks(&data, 256);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 256));
    }

    #[test]
    fn test_split_chunks_remainder() {
        let data = Bytes::from(vec![7u8; 1000]);
        let chunks = split_chunks(&data, 256);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].len(), 256);
        assert_eq!(chunks[3].len(), 1000 - 3 * 256);
    }

    #[test]
    fn test_split_chunks_small_payload() {
        let data = Bytes::from_static(b"hello");
        let chunks = split_chunks(&data, DEFAULT_CHUNK_SIZE);
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], b"hello");
    }

    #[test]
    fn test_split_chunks_empty_payload() {
        let data = Bytes::new();
        assert!(split_chunks(&data, DEFAULT_CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_split_chunks_reassembles_in_order() {
        let data: Bytes = (0..=255u8).cycle().take(3000).collect::<Vec<u8>>().into();
        let chunks = split_chunks(&data, 777);
        let mut reassembled = Vec::new();
        for chunk in &chunks {
            reassembled.extend_from_slice(chunk);
        }
        assert_eq!(reassembled, data.as_ref());
    }
}
