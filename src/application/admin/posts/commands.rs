use std::collections::BTreeSet;

use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::metrics::{
    METRIC_COMPENSATIONS, METRIC_POSTS_CREATED, METRIC_POSTS_TOGGLED,
};
use crate::application::repos::{CreatePostParams, RepoError};
use crate::application::storage::{StoredBlob, discard_blob, discard_blob_url, store_image};
use crate::domain::entities::PostRecord;
use crate::domain::posts::resolve_excerpt;
use crate::domain::uploads::Bucket;

use super::service::AdminPostService;
use super::types::{AdminPostError, CreatePostCommand, ensure_non_empty};

impl AdminPostService {
    /// Upload the featured image, insert the post, then associate its tags.
    ///
    /// When a later step fails the earlier ones are undone: a failed insert
    /// removes the uploaded image, a failed tag association deletes the post
    /// and the image.
    pub async fn create_post(
        &self,
        actor: &str,
        command: CreatePostCommand,
    ) -> Result<PostRecord, AdminPostError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.content, "content")?;
        ensure_non_empty(&command.author, "author")?;

        let CreatePostCommand {
            title,
            content,
            author,
            excerpt,
            featured_image,
            tag_ids,
            action,
        } = command;

        let stored = match featured_image.as_ref() {
            Some(image) => Some(
                store_image(
                    self.blobs.as_ref(),
                    Bucket::BlogImages,
                    image,
                    self.max_image_bytes,
                )
                .await?,
            ),
            None => None,
        };

        let excerpt = resolve_excerpt(excerpt.as_deref(), &content);
        let params = CreatePostParams {
            title: title.trim().to_string(),
            content,
            excerpt,
            author: author.trim().to_string(),
            featured_image_url: stored.as_ref().map(|blob| blob.public_url.clone()),
            published: action.publishes(),
        };

        let post = match self.writer.create_post(params).await {
            Ok(post) => post,
            Err(err) => {
                self.undo_upload(stored.as_ref()).await;
                return Err(AdminPostError::Repo(err));
            }
        };

        let tag_ids = dedup_tag_ids(&tag_ids);
        if !tag_ids.is_empty() {
            if let Err(err) = self.post_tags.attach_tags(post.id, &tag_ids).await {
                warn!(
                    target = "bravespace::application::admin::posts",
                    post_id = %post.id,
                    error = %err,
                    "tag association failed; rolling back post"
                );
                self.undo_insert(post.id).await;
                self.undo_upload(stored.as_ref()).await;
                return Err(AdminPostError::Repo(err));
            }
        }

        counter!(
            METRIC_POSTS_CREATED,
            "published" => if post.published { "true" } else { "false" }
        )
        .increment(1);
        info!(
            target = "bravespace::application::admin::posts",
            actor,
            post_id = %post.id,
            published = post.published,
            tags = tag_ids.len(),
            "post created"
        );

        Ok(post)
    }

    /// Flip the visibility of a post with a single write.
    pub async fn toggle_published(
        &self,
        actor: &str,
        id: Uuid,
    ) -> Result<PostRecord, AdminPostError> {
        let current = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        let post = self
            .writer
            .set_published(id, !current.published)
            .await
            .map_err(AdminPostError::from_repo)?;

        counter!(METRIC_POSTS_TOGGLED).increment(1);
        info!(
            target = "bravespace::application::admin::posts",
            actor,
            post_id = %post.id,
            published = post.published,
            "post visibility toggled"
        );

        Ok(post)
    }

    /// Delete a post; its tag associations go with it and its featured image
    /// is removed from blob storage.
    pub async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), AdminPostError> {
        let existing = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        self.writer
            .delete_post(id)
            .await
            .map_err(AdminPostError::from_repo)?;

        if let Some(url) = existing.featured_image_url.as_deref() {
            discard_blob_url(self.blobs.as_ref(), Bucket::BlogImages, url).await;
        }

        info!(
            target = "bravespace::application::admin::posts",
            actor,
            post_id = %id,
            "post deleted"
        );

        Ok(())
    }

    async fn undo_insert(&self, post_id: Uuid) {
        let outcome = match self.writer.delete_post(post_id).await {
            Ok(()) | Err(RepoError::NotFound) => "ok",
            Err(err) => {
                warn!(
                    target = "bravespace::application::admin::posts",
                    post_id = %post_id,
                    error = %err,
                    "failed to delete post during rollback"
                );
                "failed"
            }
        };
        counter!(METRIC_COMPENSATIONS, "step" => "delete_post", "outcome" => outcome)
            .increment(1);
    }

    async fn undo_upload(&self, stored: Option<&StoredBlob>) {
        if let Some(blob) = stored {
            discard_blob(self.blobs.as_ref(), blob.bucket, &blob.key).await;
        }
    }
}

fn dedup_tag_ids(tag_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = BTreeSet::new();
    tag_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
