//! Public read side: published posts with their tags, the tag bar, founders
//! and the gallery.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    FoundersRepo, GalleryRepo, PostTagsRepo, PostsRepo, RepoError, TagsRepo,
};
use crate::domain::entities::{FounderRecord, GalleryImageRecord, PostRecord, TagRecord};
use crate::domain::filter::TagFilter;
use crate::domain::posts::ReadTime;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A post as rendered by listings, with tags and derived read time.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub excerpt: String,
    pub author: String,
    pub featured_image_url: Option<String>,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub tags: Vec<TagRecord>,
    pub read_time_minutes: u32,
    pub read_time_label: String,
}

impl PostView {
    pub fn assemble(post: PostRecord, tags: Vec<TagRecord>) -> Self {
        let read_time = ReadTime::estimate(&post.content);
        let content_html = ammonia::clean(&post.content);
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            content_html,
            excerpt: post.excerpt,
            author: post.author,
            featured_image_url: post.featured_image_url,
            published: post.published,
            created_at: post.created_at,
            tags,
            read_time_minutes: read_time.minutes(),
            read_time_label: read_time.to_string(),
        }
    }
}

/// Attach tags to each post using one batched association lookup.
pub(crate) async fn with_tags(
    post_tags: &dyn PostTagsRepo,
    posts: Vec<PostRecord>,
) -> Result<Vec<PostView>, RepoError> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
    let mut grouped: HashMap<Uuid, Vec<TagRecord>> = HashMap::new();
    for link in post_tags.list_tags_for_posts(&ids).await? {
        grouped.entry(link.post_id).or_default().push(link.tag);
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let mut tags = grouped.remove(&post.id).unwrap_or_default();
            tags.sort_by(|left, right| left.name.cmp(&right.name));
            PostView::assemble(post, tags)
        })
        .collect())
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    post_tags: Arc<dyn PostTagsRepo>,
    tags: Arc<dyn TagsRepo>,
    founders: Arc<dyn FoundersRepo>,
    gallery: Arc<dyn GalleryRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        post_tags: Arc<dyn PostTagsRepo>,
        tags: Arc<dyn TagsRepo>,
        founders: Arc<dyn FoundersRepo>,
        gallery: Arc<dyn GalleryRepo>,
    ) -> Self {
        Self {
            posts,
            post_tags,
            tags,
            founders,
            gallery,
        }
    }

    /// Published posts, newest first. A filter naming an unknown tag yields
    /// an empty list.
    pub async fn list_published(&self, filter: TagFilter) -> Result<Vec<PostView>, FeedError> {
        let posts = self.posts.list_published(filter.selected()).await?;
        let views = with_tags(self.post_tags.as_ref(), posts).await?;
        Ok(views)
    }

    pub async fn find_published(&self, id: Uuid) -> Result<PostView, FeedError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .filter(|post| post.published)
            .ok_or(FeedError::NotFound)?;

        let mut views = with_tags(self.post_tags.as_ref(), vec![post]).await?;
        views.pop().ok_or(FeedError::NotFound)
    }

    pub async fn list_tags(&self) -> Result<Vec<TagRecord>, FeedError> {
        Ok(self.tags.list_by_name().await?)
    }

    pub async fn list_founders(&self) -> Result<Vec<FounderRecord>, FeedError> {
        Ok(self.founders.list_founders().await?)
    }

    pub async fn list_gallery(&self) -> Result<Vec<GalleryImageRecord>, FeedError> {
        Ok(self.gallery.list_images().await?)
    }
}
