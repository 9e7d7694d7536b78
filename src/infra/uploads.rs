//! Filesystem blob store serving public URLs under `/uploads`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::application::storage::{BlobStore, BlobStoreError, StoredBlob};
use crate::domain::uploads::{Bucket, is_safe_blob_key, random_blob_key};

/// Route prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Filesystem-backed blob storage. Every bucket is a directory below `root`.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Initialise storage rooted at the provided directory, creating one
    /// directory per bucket.
    pub fn new(root: PathBuf, public_base_url: &str) -> Result<Self, std::io::Error> {
        for bucket in Bucket::ALL {
            std::fs::create_dir_all(root.join(bucket.as_str()))?;
        }
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}{PUBLIC_PREFIX}/{bucket}/{key}", self.public_base_url)
    }

    /// Absolute filesystem path of a blob, rejecting keys that could escape
    /// the bucket directory.
    pub fn resolve(&self, bucket: Bucket, key: &str) -> Result<PathBuf, BlobStoreError> {
        if !is_safe_blob_key(key) {
            return Err(BlobStoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(bucket.as_str()).join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        bucket: Bucket,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredBlob, BlobStoreError> {
        if data.is_empty() {
            return Err(BlobStoreError::EmptyPayload);
        }

        let key = random_blob_key(original_name);
        let absolute = self.resolve(bucket, &key)?;

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data));
        let size_bytes =
            i64::try_from(data.len()).map_err(|_| BlobStoreError::SizeOverflow)?;

        debug!(
            target = "bravespace::infra::uploads",
            bucket = %bucket,
            key = %key,
            content_type,
            size_bytes,
            "blob stored"
        );

        Ok(StoredBlob {
            bucket,
            public_url: self.public_url(bucket, &key),
            key,
            size_bytes,
            checksum,
        })
    }

    async fn read(&self, bucket: Bucket, key: &str) -> Result<Bytes, BlobStoreError> {
        let absolute = self.resolve(bucket, key)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, bucket: Bucket, key: &str) -> Result<(), BlobStoreError> {
        let absolute = self.resolve(bucket, key)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BlobStoreError::Io(err)),
        }
    }

    fn key_from_public_url(&self, bucket: Bucket, url: &str) -> Option<String> {
        let prefix = format!("{}{PUBLIC_PREFIX}/{bucket}/", self.public_base_url);
        url.strip_prefix(&prefix)
            .filter(|key| is_safe_blob_key(key))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> FsBlobStore {
        FsBlobStore::new(dir.to_path_buf(), "http://localhost:8080/").expect("store")
    }

    #[tokio::test]
    async fn put_writes_file_and_builds_public_url() {
        let dir = tempdir().expect("tempdir");
        let blobs = store(dir.path());

        let stored = blobs
            .put(
                Bucket::BlogImages,
                "Cover.PNG",
                "image/png",
                Bytes::from_static(b"png-bytes"),
            )
            .await
            .expect("stored");

        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.size_bytes, 9);
        assert_eq!(stored.checksum.len(), 64);
        assert_eq!(
            stored.public_url,
            format!("http://localhost:8080/uploads/blog-images/{}", stored.key)
        );
        let on_disk = blobs
            .read(Bucket::BlogImages, &stored.key)
            .await
            .expect("read back");
        assert_eq!(on_disk.as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn key_is_recovered_from_public_url_of_same_bucket_only() {
        let dir = tempdir().expect("tempdir");
        let blobs = store(dir.path());
        let stored = blobs
            .put(
                Bucket::GalleryImages,
                "a.jpg",
                "image/jpeg",
                Bytes::from_static(b"x"),
            )
            .await
            .expect("stored");

        assert_eq!(
            blobs.key_from_public_url(Bucket::GalleryImages, &stored.public_url),
            Some(stored.key.clone())
        );
        assert_eq!(
            blobs.key_from_public_url(Bucket::BlogImages, &stored.public_url),
            None
        );
        assert_eq!(
            blobs.key_from_public_url(Bucket::GalleryImages, "https://cdn.example.com/a.jpg"),
            None
        );
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let blobs = store(dir.path());
        let stored = blobs
            .put(
                Bucket::FounderImages,
                "face.webp",
                "image/webp",
                Bytes::from_static(b"x"),
            )
            .await
            .expect("stored");

        blobs
            .remove(Bucket::FounderImages, &stored.key)
            .await
            .expect("removed");
        blobs
            .remove(Bucket::FounderImages, &stored.key)
            .await
            .expect("second remove is a no-op");
        assert!(
            !dir.path()
                .join("founder-images")
                .join(&stored.key)
                .exists()
        );
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let blobs = store(dir.path());
        assert!(matches!(
            blobs.resolve(Bucket::BlogImages, "../etc/passwd"),
            Err(BlobStoreError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let blobs = store(dir.path());
        let result = blobs
            .put(Bucket::BlogImages, "a.png", "image/png", Bytes::new())
            .await;
        assert!(matches!(result, Err(BlobStoreError::EmptyPayload)));
    }
}
