use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::application::storage::UploadError;
use crate::domain::uploads::ImageUpload;

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("`{0}` must not be empty")]
    ConstraintViolation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error("featured image upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminPostError {
    pub(crate) fn from_repo(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AdminPostError::NotFound,
            other => AdminPostError::Repo(other),
        }
    }
}

/// Which button submitted the editor form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostAction {
    Publish,
    #[default]
    SaveDraft,
}

impl PostAction {
    pub fn publishes(self) -> bool {
        matches!(self, PostAction::Publish)
    }
}

impl FromStr for PostAction {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "publish" => Ok(PostAction::Publish),
            "draft" | "save_draft" | "save-draft" => Ok(PostAction::SaveDraft),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub author: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<ImageUpload>,
    pub tag_ids: Vec<Uuid>,
    pub action: PostAction,
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        return Err(AdminPostError::ConstraintViolation(field));
    }
    Ok(())
}
