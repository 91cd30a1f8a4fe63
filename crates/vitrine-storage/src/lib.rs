//! Vitrine Storage Library
//!
//! Chunked blob storage for product images. The `BlobStore` trait is the
//! seam the repositories program against; the Postgres implementation keeps
//! image bytes in the same database as the catalog, split into fixed-size
//! chunks so large files never have to be materialized in one allocation
//! on the read path.

pub mod pg;
pub mod traits;

pub use pg::{PgBlobStore, DEFAULT_CHUNK_SIZE};
pub use traits::{AssetInfo, BlobStore, BlobStream, StorageError, StorageResult};
