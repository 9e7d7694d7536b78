//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{FounderRecord, GalleryImageRecord, PostRecord, TagRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub featured_image_url: Option<String>,
    pub published: bool,
}

/// Tag attached to a post, as returned by the batched association lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PostTagLink {
    pub post_id: Uuid,
    pub tag: TagRecord,
}

#[derive(Debug, Clone)]
pub struct CreateTagParams {
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct FounderParams {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct CreateGalleryImageParams {
    pub image_url: String,
    pub alt_text: String,
    pub sort_order: i32,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Published posts, newest first, optionally restricted to one tag.
    async fn list_published(&self, tag: Option<Uuid>) -> Result<Vec<PostRecord>, RepoError>;

    /// Every post regardless of visibility, newest first.
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row matches.
    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row matches.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostTagsRepo: Send + Sync {
    /// Insert every `(post_id, tag_id)` pair in one statement.
    async fn attach_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    /// Tags for a set of posts, fetched in a single round trip.
    async fn list_tags_for_posts(&self, post_ids: &[Uuid])
    -> Result<Vec<PostTagLink>, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Public tag bar order.
    async fn list_by_name(&self) -> Result<Vec<TagRecord>, RepoError>;

    /// Admin manager order.
    async fn list_newest_first(&self) -> Result<Vec<TagRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    /// Returns [`RepoError::Duplicate`] when the slug is taken.
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row matches.
    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FoundersRepo: Send + Sync {
    async fn list_founders(&self) -> Result<Vec<FounderRecord>, RepoError>;

    async fn find_founder(&self, id: Uuid) -> Result<Option<FounderRecord>, RepoError>;

    async fn create_founder(&self, params: FounderParams) -> Result<FounderRecord, RepoError>;

    async fn update_founder(
        &self,
        id: Uuid,
        params: FounderParams,
    ) -> Result<FounderRecord, RepoError>;

    async fn delete_founder(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait GalleryRepo: Send + Sync {
    async fn list_images(&self) -> Result<Vec<GalleryImageRecord>, RepoError>;

    async fn count_images(&self) -> Result<u64, RepoError>;

    async fn find_image(&self, id: Uuid) -> Result<Option<GalleryImageRecord>, RepoError>;

    async fn insert_image(
        &self,
        params: CreateGalleryImageParams,
    ) -> Result<GalleryImageRecord, RepoError>;

    async fn delete_image(&self, id: Uuid) -> Result<(), RepoError>;
}
