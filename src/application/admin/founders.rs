use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{FounderParams, FoundersRepo, RepoError};
use crate::application::storage::{
    BlobStore, StoredBlob, UploadError, discard_blob, discard_blob_url, store_image,
};
use crate::domain::entities::FounderRecord;
use crate::domain::uploads::{Bucket, ImageUpload};

#[derive(Debug, Error)]
pub enum FounderError {
    #[error("`{0}` is invalid")]
    ConstraintViolation(&'static str),
    #[error("founder not found")]
    NotFound,
    #[error("founder image upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Editor payload for both creation and update.
#[derive(Debug, Clone)]
pub struct FounderCommand {
    pub name: String,
    pub description: String,
    pub sort_order: i32,
    pub image: Option<ImageUpload>,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct AdminFounderService {
    repo: Arc<dyn FoundersRepo>,
    blobs: Arc<dyn BlobStore>,
    max_image_bytes: u64,
}

impl AdminFounderService {
    pub fn new(repo: Arc<dyn FoundersRepo>, blobs: Arc<dyn BlobStore>, max_image_bytes: u64) -> Self {
        Self {
            repo,
            blobs,
            max_image_bytes,
        }
    }

    pub async fn list(&self) -> Result<Vec<FounderRecord>, FounderError> {
        Ok(self.repo.list_founders().await?)
    }

    pub async fn create(
        &self,
        actor: &str,
        command: FounderCommand,
    ) -> Result<FounderRecord, FounderError> {
        validate(&command)?;
        let fallback_url = non_blank(command.image_url.as_deref());
        let stored = self.upload(command.image.as_ref()).await?;
        let image_url = match (&stored, fallback_url) {
            (Some(blob), _) => blob.public_url.clone(),
            (None, Some(url)) => url,
            (None, None) => return Err(FounderError::ConstraintViolation("image")),
        };

        let params = FounderParams {
            name: command.name.trim().to_string(),
            description: command.description.trim().to_string(),
            image_url,
            sort_order: command.sort_order,
        };

        let founder = match self.repo.create_founder(params).await {
            Ok(founder) => founder,
            Err(err) => {
                self.undo_upload(stored.as_ref()).await;
                return Err(err.into());
            }
        };

        info!(
            target = "bravespace::application::admin::founders",
            actor,
            founder_id = %founder.id,
            "founder created"
        );
        Ok(founder)
    }

    /// Update a founder. Without a new image file the current image is kept.
    pub async fn update(
        &self,
        actor: &str,
        id: Uuid,
        command: FounderCommand,
    ) -> Result<FounderRecord, FounderError> {
        validate(&command)?;
        let existing = self
            .repo
            .find_founder(id)
            .await?
            .ok_or(FounderError::NotFound)?;

        let stored = self.upload(command.image.as_ref()).await?;
        let image_url = match &stored {
            Some(blob) => blob.public_url.clone(),
            None => non_blank(command.image_url.as_deref())
                .unwrap_or_else(|| existing.image_url.clone()),
        };

        let params = FounderParams {
            name: command.name.trim().to_string(),
            description: command.description.trim().to_string(),
            image_url,
            sort_order: command.sort_order,
        };

        let founder = match self.repo.update_founder(id, params).await {
            Ok(founder) => founder,
            Err(err) => {
                self.undo_upload(stored.as_ref()).await;
                return Err(match err {
                    RepoError::NotFound => FounderError::NotFound,
                    other => FounderError::Repo(other),
                });
            }
        };

        if founder.image_url != existing.image_url {
            discard_blob_url(
                self.blobs.as_ref(),
                Bucket::FounderImages,
                &existing.image_url,
            )
            .await;
        }

        info!(
            target = "bravespace::application::admin::founders",
            actor,
            founder_id = %founder.id,
            "founder updated"
        );
        Ok(founder)
    }

    pub async fn delete(&self, actor: &str, id: Uuid) -> Result<(), FounderError> {
        let existing = self
            .repo
            .find_founder(id)
            .await?
            .ok_or(FounderError::NotFound)?;

        self.repo.delete_founder(id).await.map_err(|err| match err {
            RepoError::NotFound => FounderError::NotFound,
            other => FounderError::Repo(other),
        })?;
        discard_blob_url(
            self.blobs.as_ref(),
            Bucket::FounderImages,
            &existing.image_url,
        )
        .await;

        info!(
            target = "bravespace::application::admin::founders",
            actor,
            founder_id = %id,
            "founder deleted"
        );
        Ok(())
    }

    async fn upload(&self, image: Option<&ImageUpload>) -> Result<Option<StoredBlob>, FounderError> {
        match image {
            Some(image) => Ok(Some(
                store_image(
                    self.blobs.as_ref(),
                    Bucket::FounderImages,
                    image,
                    self.max_image_bytes,
                )
                .await?,
            )),
            None => Ok(None),
        }
    }

    async fn undo_upload(&self, stored: Option<&StoredBlob>) {
        if let Some(blob) = stored {
            discard_blob(self.blobs.as_ref(), blob.bucket, &blob.key).await;
        }
    }
}

fn validate(command: &FounderCommand) -> Result<(), FounderError> {
    if command.name.trim().is_empty() {
        return Err(FounderError::ConstraintViolation("name"));
    }
    if command.description.trim().is_empty() {
        return Err(FounderError::ConstraintViolation("description"));
    }
    if command.sort_order < 0 {
        return Err(FounderError::ConstraintViolation("sort_order"));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
