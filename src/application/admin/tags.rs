use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CreateTagParams, RepoError, TagsRepo, TagsWriteRepo};
use crate::domain::entities::TagRecord;
use crate::domain::slug::derive_slug;

/// Colour given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").expect("valid colour pattern")
});

#[derive(Debug, Error)]
pub enum AdminTagError {
    #[error("`{0}` is invalid")]
    ConstraintViolation(&'static str),
    #[error("tag not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateTagCommand {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Clone)]
pub struct AdminTagService {
    reader: Arc<dyn TagsRepo>,
    writer: Arc<dyn TagsWriteRepo>,
}

impl AdminTagService {
    pub fn new(reader: Arc<dyn TagsRepo>, writer: Arc<dyn TagsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_tags(&self) -> Result<Vec<TagRecord>, AdminTagError> {
        self.reader
            .list_newest_first()
            .await
            .map_err(AdminTagError::from)
    }

    /// Create a tag. The slug is derived once from the name and never
    /// regenerated; a slug collision surfaces as [`RepoError::Duplicate`].
    pub async fn create_tag(
        &self,
        actor: &str,
        command: CreateTagCommand,
    ) -> Result<TagRecord, AdminTagError> {
        let name = command.name.trim().to_string();
        ensure_non_empty(&name, "name")?;

        let slug = derive_slug(&name).map_err(|_| AdminTagError::ConstraintViolation("name"))?;
        let color = normalize_color(command.color.as_deref())?;

        let tag = self
            .writer
            .create_tag(CreateTagParams { name, slug, color })
            .await?;

        info!(
            target = "bravespace::application::admin::tags",
            actor,
            tag_id = %tag.id,
            slug = %tag.slug,
            "tag created"
        );
        Ok(tag)
    }

    /// Delete a tag; its post associations are removed with it.
    pub async fn delete_tag(&self, actor: &str, id: Uuid) -> Result<(), AdminTagError> {
        self.writer.delete_tag(id).await.map_err(|err| match err {
            RepoError::NotFound => AdminTagError::NotFound,
            other => AdminTagError::Repo(other),
        })?;

        info!(
            target = "bravespace::application::admin::tags",
            actor,
            tag_id = %id,
            "tag deleted"
        );
        Ok(())
    }
}

fn normalize_color(color: Option<&str>) -> Result<String, AdminTagError> {
    match color.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_TAG_COLOR.to_string()),
        Some(value) if HEX_COLOR.is_match(value) => Ok(value.to_ascii_uppercase()),
        Some(_) => Err(AdminTagError::ConstraintViolation("color")),
    }
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminTagError> {
    if value.trim().is_empty() {
        return Err(AdminTagError::ConstraintViolation(field));
    }
    Ok(())
}
