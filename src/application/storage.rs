//! Blob storage boundary used for featured images, founder portraits and
//! gallery photos.

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::application::metrics::{METRIC_COMPENSATIONS, METRIC_UPLOADS_STORED};
use crate::domain::uploads::{Bucket, ImageUpload, ImageValidationError};

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob key `{key}`")]
    InvalidKey { key: String },
    #[error("blob payload is empty")]
    EmptyPayload,
    #[error("blob size exceeds supported range")]
    SizeOverflow,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Metadata describing a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bucket: Bucket,
    pub key: String,
    pub public_url: String,
    pub size_bytes: i64,
    pub checksum: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under a fresh random key that keeps the extension of
    /// `original_name`.
    async fn put(
        &self,
        bucket: Bucket,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredBlob, BlobStoreError>;

    /// Read a stored blob back. Missing blobs surface as an `Io` error of
    /// kind `NotFound`.
    async fn read(&self, bucket: Bucket, key: &str) -> Result<Bytes, BlobStoreError>;

    /// Remove a blob. Missing blobs are treated as success.
    async fn remove(&self, bucket: Bucket, key: &str) -> Result<(), BlobStoreError>;

    /// Recover the key of a blob from a public URL this store produced.
    fn key_from_public_url(&self, bucket: Bucket, url: &str) -> Option<String>;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ImageValidationError),
    #[error(transparent)]
    Store(#[from] BlobStoreError),
}

impl BlobStoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            BlobStoreError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            BlobStoreError::InvalidKey { .. } => true,
            _ => false,
        }
    }
}

impl UploadError {
    pub fn is_too_large(&self) -> bool {
        matches!(
            self,
            UploadError::Invalid(ImageValidationError::TooLarge { .. })
        )
    }
}

/// Validate an image and write it to `bucket`.
pub async fn store_image(
    blobs: &dyn BlobStore,
    bucket: Bucket,
    image: &ImageUpload,
    max_bytes: u64,
) -> Result<StoredBlob, UploadError> {
    image.validate(max_bytes)?;
    let stored = blobs
        .put(
            bucket,
            &image.filename,
            &image.content_type,
            image.data.clone(),
        )
        .await?;
    counter!(METRIC_UPLOADS_STORED, "bucket" => bucket.as_str()).increment(1);
    Ok(stored)
}

/// Remove the blob behind `public_url`, logging instead of failing.
///
/// URLs that were not produced by the store (external links entered by hand)
/// are left alone.
pub async fn discard_blob_url(blobs: &dyn BlobStore, bucket: Bucket, public_url: &str) {
    let Some(key) = blobs.key_from_public_url(bucket, public_url) else {
        return;
    };
    discard_blob(blobs, bucket, &key).await;
}

/// Remove a blob by key, logging instead of failing.
pub async fn discard_blob(blobs: &dyn BlobStore, bucket: Bucket, key: &str) {
    if let Err(err) = blobs.remove(bucket, key).await {
        counter!(METRIC_COMPENSATIONS, "step" => "remove_blob", "outcome" => "failed")
            .increment(1);
        warn!(
            target = "bravespace::application::storage",
            bucket = %bucket,
            key,
            error = %err,
            "failed to remove blob"
        );
    }
}
