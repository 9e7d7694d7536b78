use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CreateGalleryImageParams, GalleryRepo, RepoError};
use crate::application::storage::{
    BlobStore, UploadError, discard_blob, discard_blob_url, store_image,
};
use crate::domain::entities::GalleryImageRecord;
use crate::domain::uploads::{Bucket, ImageUpload};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("no files were provided")]
    NoFiles,
    #[error("image not found")]
    NotFound,
    #[error("upload of `{filename}` failed: {source}")]
    Upload {
        filename: String,
        #[source]
        source: UploadError,
    },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AdminGalleryService {
    repo: Arc<dyn GalleryRepo>,
    blobs: Arc<dyn BlobStore>,
    max_image_bytes: u64,
}

impl AdminGalleryService {
    pub fn new(repo: Arc<dyn GalleryRepo>, blobs: Arc<dyn BlobStore>, max_image_bytes: u64) -> Self {
        Self {
            repo,
            blobs,
            max_image_bytes,
        }
    }

    pub async fn list(&self) -> Result<Vec<GalleryImageRecord>, GalleryError> {
        Ok(self.repo.list_images().await?)
    }

    /// Store each file in order and append it to the gallery. The first
    /// failure stops the batch; images stored before it are kept.
    pub async fn upload(
        &self,
        actor: &str,
        files: Vec<ImageUpload>,
    ) -> Result<Vec<GalleryImageRecord>, GalleryError> {
        if files.is_empty() {
            return Err(GalleryError::NoFiles);
        }

        let existing = self.repo.count_images().await?;
        let base = i32::try_from(existing).unwrap_or(i32::MAX);
        let mut inserted = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            let stored = store_image(
                self.blobs.as_ref(),
                Bucket::GalleryImages,
                file,
                self.max_image_bytes,
            )
            .await
            .map_err(|source| GalleryError::Upload {
                filename: file.filename.clone(),
                source,
            })?;

            let offset = i32::try_from(index).unwrap_or(i32::MAX);
            let params = CreateGalleryImageParams {
                image_url: stored.public_url.clone(),
                alt_text: file.stem(),
                sort_order: base.saturating_add(offset).saturating_add(1),
            };

            match self.repo.insert_image(params).await {
                Ok(record) => inserted.push(record),
                Err(err) => {
                    discard_blob(self.blobs.as_ref(), stored.bucket, &stored.key).await;
                    return Err(err.into());
                }
            }
        }

        info!(
            target = "bravespace::application::admin::gallery",
            actor,
            count = inserted.len(),
            "gallery images uploaded"
        );
        Ok(inserted)
    }

    pub async fn delete(&self, actor: &str, id: Uuid) -> Result<(), GalleryError> {
        let image = self
            .repo
            .find_image(id)
            .await?
            .ok_or(GalleryError::NotFound)?;

        discard_blob_url(self.blobs.as_ref(), Bucket::GalleryImages, &image.image_url).await;
        self.repo.delete_image(id).await.map_err(|err| match err {
            RepoError::NotFound => GalleryError::NotFound,
            other => GalleryError::Repo(other),
        })?;

        info!(
            target = "bravespace::application::admin::gallery",
            actor,
            image_id = %id,
            "gallery image deleted"
        );
        Ok(())
    }
}
