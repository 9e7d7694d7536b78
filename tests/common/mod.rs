#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use bravespace::application::admin::{
    AdminFounderService, AdminGalleryService, AdminPostService, AdminTagService,
};
use bravespace::application::auth::{AdminAuthService, AdminCredentials};
use bravespace::application::feed::FeedService;
use bravespace::application::repos::{
    CreateGalleryImageParams, CreatePostParams, CreateTagParams, FounderParams, FoundersRepo,
    GalleryRepo, PostTagLink, PostTagsRepo, PostsRepo, PostsWriteRepo, RepoError, TagsRepo,
    TagsWriteRepo,
};
use bravespace::application::storage::{BlobStore, BlobStoreError, StoredBlob};
use bravespace::domain::entities::{
    FounderRecord, GalleryImageRecord, PostRecord, PostTagRecord, TagRecord,
};
use bravespace::domain::uploads::{Bucket, ImageUpload, random_blob_key};
use bravespace::infra::http::{HealthCheck, HttpState, build_router};

pub const ADMIN_USER: &str = "editor";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const MAX_IMAGE_BYTES: u64 = 64 * 1024;

#[derive(Default)]
struct Tables {
    posts: Vec<PostRecord>,
    tags: Vec<TagRecord>,
    post_tags: Vec<PostTagRecord>,
    founders: Vec<FounderRecord>,
    gallery: Vec<GalleryImageRecord>,
}

/// In-memory content store with the constraints of the Postgres schema:
/// unique tag slugs, cascading association rows and foreign-key checks.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: AtomicI64,
    writes: AtomicUsize,
    pub fail_create_post: AtomicBool,
    pub fail_attach_tags: AtomicBool,
    pub fail_delete_post: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn now(&self) -> OffsetDateTime {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        OffsetDateTime::UNIX_EPOCH + time::Duration::days(20_000) + time::Duration::seconds(tick)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of write operations that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn posts(&self) -> Vec<PostRecord> {
        self.tables.lock().await.posts.clone()
    }

    pub async fn post_tags(&self) -> Vec<PostTagRecord> {
        self.tables.lock().await.post_tags.clone()
    }

    pub async fn tags(&self) -> Vec<TagRecord> {
        self.tables.lock().await.tags.clone()
    }
}

fn newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then(right.id.cmp(&left.id))
    });
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_published(&self, tag: Option<Uuid>) -> Result<Vec<PostRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut posts: Vec<PostRecord> = tables
            .posts
            .iter()
            .filter(|post| post.published)
            .filter(|post| match tag {
                None => true,
                Some(tag_id) => tables
                    .post_tags
                    .iter()
                    .any(|link| link.post_id == post.id && link.tag_id == tag_id),
            })
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts = self.tables.lock().await.posts.clone();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().find(|post| post.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.record_write();
        if self.fail_create_post.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("insert rejected".to_string()));
        }
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            content: params.content,
            excerpt: params.excerpt,
            author: params.author,
            featured_image_url: params.featured_image_url,
            published: params.published,
            created_at: self.now(),
        };
        self.tables.lock().await.posts.push(post.clone());
        Ok(post)
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError> {
        self.record_write();
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.published = published;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        self.record_write();
        if self.fail_delete_post.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("delete rejected".to_string()));
        }
        let mut tables = self.tables.lock().await;
        let before = tables.posts.len();
        tables.posts.retain(|post| post.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.post_tags.retain(|link| link.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostTagsRepo for MemoryStore {
    async fn attach_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        self.record_write();
        if self.fail_attach_tags.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("association insert rejected".to_string()));
        }
        let mut tables = self.tables.lock().await;
        if !tables.posts.iter().any(|post| post.id == post_id) {
            return Err(RepoError::InvalidInput {
                message: "post_tags_post_id_fkey".to_string(),
            });
        }
        if let Some(missing) = tag_ids
            .iter()
            .find(|tag_id| !tables.tags.iter().any(|tag| tag.id == **tag_id))
        {
            return Err(RepoError::InvalidInput {
                message: format!("post_tags_tag_id_fkey: {missing}"),
            });
        }
        for tag_id in tag_ids {
            let link = PostTagRecord {
                post_id,
                tag_id: *tag_id,
            };
            if !tables.post_tags.contains(&link) {
                tables.post_tags.push(link);
            }
        }
        Ok(())
    }

    async fn list_tags_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<Vec<PostTagLink>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .post_tags
            .iter()
            .filter(|link| post_ids.contains(&link.post_id))
            .filter_map(|link| {
                tables
                    .tags
                    .iter()
                    .find(|tag| tag.id == link.tag_id)
                    .map(|tag| PostTagLink {
                        post_id: link.post_id,
                        tag: tag.clone(),
                    })
            })
            .collect())
    }
}

#[async_trait]
impl TagsRepo for MemoryStore {
    async fn list_by_name(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.tables.lock().await.tags.clone();
        tags.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(tags)
    }

    async fn list_newest_first(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.tables.lock().await.tags.clone();
        tags.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(tags)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.tags.iter().find(|tag| tag.id == id).cloned())
    }
}

#[async_trait]
impl TagsWriteRepo for MemoryStore {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        self.record_write();
        let created_at = self.now();
        let mut tables = self.tables.lock().await;
        if tables.tags.iter().any(|tag| tag.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "tags_slug_key".to_string(),
            });
        }
        let tag = TagRecord {
            id: Uuid::new_v4(),
            name: params.name,
            slug: params.slug,
            color: params.color,
            created_at,
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        self.record_write();
        let mut tables = self.tables.lock().await;
        let before = tables.tags.len();
        tables.tags.retain(|tag| tag.id != id);
        if tables.tags.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.post_tags.retain(|link| link.tag_id != id);
        Ok(())
    }
}

#[async_trait]
impl FoundersRepo for MemoryStore {
    async fn list_founders(&self) -> Result<Vec<FounderRecord>, RepoError> {
        let mut founders = self.tables.lock().await.founders.clone();
        founders.sort_by(|left, right| {
            left.sort_order
                .cmp(&right.sort_order)
                .then(left.created_at.cmp(&right.created_at))
        });
        Ok(founders)
    }

    async fn find_founder(&self, id: Uuid) -> Result<Option<FounderRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.founders.iter().find(|founder| founder.id == id).cloned())
    }

    async fn create_founder(&self, params: FounderParams) -> Result<FounderRecord, RepoError> {
        self.record_write();
        let now = self.now();
        let founder = FounderRecord {
            id: Uuid::new_v4(),
            name: params.name,
            description: params.description,
            image_url: params.image_url,
            sort_order: params.sort_order,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.founders.push(founder.clone());
        Ok(founder)
    }

    async fn update_founder(
        &self,
        id: Uuid,
        params: FounderParams,
    ) -> Result<FounderRecord, RepoError> {
        self.record_write();
        let now = self.now();
        let mut tables = self.tables.lock().await;
        let founder = tables
            .founders
            .iter_mut()
            .find(|founder| founder.id == id)
            .ok_or(RepoError::NotFound)?;
        founder.name = params.name;
        founder.description = params.description;
        founder.image_url = params.image_url;
        founder.sort_order = params.sort_order;
        founder.updated_at = now;
        Ok(founder.clone())
    }

    async fn delete_founder(&self, id: Uuid) -> Result<(), RepoError> {
        self.record_write();
        let mut tables = self.tables.lock().await;
        let before = tables.founders.len();
        tables.founders.retain(|founder| founder.id != id);
        if tables.founders.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GalleryRepo for MemoryStore {
    async fn list_images(&self) -> Result<Vec<GalleryImageRecord>, RepoError> {
        let mut images = self.tables.lock().await.gallery.clone();
        images.sort_by(|left, right| {
            left.sort_order
                .cmp(&right.sort_order)
                .then(left.created_at.cmp(&right.created_at))
        });
        Ok(images)
    }

    async fn count_images(&self) -> Result<u64, RepoError> {
        Ok(self.tables.lock().await.gallery.len() as u64)
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<GalleryImageRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.gallery.iter().find(|image| image.id == id).cloned())
    }

    async fn insert_image(
        &self,
        params: CreateGalleryImageParams,
    ) -> Result<GalleryImageRecord, RepoError> {
        self.record_write();
        let image = GalleryImageRecord {
            id: Uuid::new_v4(),
            image_url: params.image_url,
            alt_text: params.alt_text,
            sort_order: params.sort_order,
            created_at: self.now(),
        };
        self.tables.lock().await.gallery.push(image.clone());
        Ok(image)
    }

    async fn delete_image(&self, id: Uuid) -> Result<(), RepoError> {
        self.record_write();
        let mut tables = self.tables.lock().await;
        let before = tables.gallery.len();
        tables.gallery.retain(|image| image.id != id);
        if tables.gallery.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

pub const BLOB_BASE: &str = "https://blobs.test";

/// In-memory blob store whose public URLs look like `{BLOB_BASE}/{bucket}/{key}`.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<(Bucket, String), Bytes>>,
    puts: AtomicUsize,
    pub fail_put: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn contains_url(&self, bucket: Bucket, url: &str) -> bool {
        match self.key_from_public_url(bucket, url) {
            Some(key) => self.blobs.lock().await.contains_key(&(bucket, key)),
            None => false,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: Bucket,
        original_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<StoredBlob, BlobStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Unavailable("bucket offline".to_string()));
        }
        if data.is_empty() {
            return Err(BlobStoreError::EmptyPayload);
        }
        let key = random_blob_key(original_name);
        let size_bytes = data.len() as i64;
        self.blobs.lock().await.insert((bucket, key.clone()), data);
        Ok(StoredBlob {
            bucket,
            public_url: format!("{BLOB_BASE}/{bucket}/{key}"),
            key,
            size_bytes,
            checksum: String::new(),
        })
    }

    async fn read(&self, bucket: Bucket, key: &str) -> Result<Bytes, BlobStoreError> {
        self.blobs
            .lock()
            .await
            .get(&(bucket, key.to_string()))
            .cloned()
            .ok_or_else(|| {
                BlobStoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such blob",
                ))
            })
    }

    async fn remove(&self, bucket: Bucket, key: &str) -> Result<(), BlobStoreError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Unavailable("bucket offline".to_string()));
        }
        self.blobs.lock().await.remove(&(bucket, key.to_string()));
        Ok(())
    }

    fn key_from_public_url(&self, bucket: Bucket, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{BLOB_BASE}/{bucket}/"))
            .map(str::to_string)
    }
}

/// Every service wired against the in-memory store and blob store.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub feed: Arc<FeedService>,
    pub posts: Arc<AdminPostService>,
    pub tags: Arc<AdminTagService>,
    pub founders: Arc<AdminFounderService>,
    pub gallery: Arc<AdminGalleryService>,
    pub auth: Arc<AdminAuthService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_credentials(Some(AdminCredentials {
            username: ADMIN_USER.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }))
    }

    pub fn with_credentials(credentials: Option<AdminCredentials>) -> Self {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let blob_store: Arc<dyn BlobStore> = blobs.clone();

        let feed = FeedService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let posts = AdminPostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            blob_store.clone(),
            MAX_IMAGE_BYTES,
        );
        let tags = AdminTagService::new(store.clone(), store.clone());
        let founders = AdminFounderService::new(store.clone(), blob_store.clone(), MAX_IMAGE_BYTES);
        let gallery = AdminGalleryService::new(store.clone(), blob_store, MAX_IMAGE_BYTES);
        let auth = AdminAuthService::new(credentials, Duration::from_secs(3600));

        Self {
            store,
            blobs,
            feed: Arc::new(feed),
            posts: Arc::new(posts),
            tags: Arc::new(tags),
            founders: Arc::new(founders),
            gallery: Arc::new(gallery),
            auth: Arc::new(auth),
        }
    }

    pub fn state(&self) -> HttpState {
        HttpState {
            feed: self.feed.clone(),
            posts: self.posts.clone(),
            tags: self.tags.clone(),
            founders: self.founders.clone(),
            gallery: self.gallery.clone(),
            auth: self.auth.clone(),
            blobs: self.blobs.clone(),
            health: self.store.clone(),
            max_request_bytes: 1024 * 1024,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }

    pub async fn tag(&self, name: &str) -> TagRecord {
        self.tags
            .create_tag(
                ADMIN_USER,
                bravespace::application::admin::tags::CreateTagCommand {
                    name: name.to_string(),
                    color: None,
                },
            )
            .await
            .expect("tag created")
    }
}

pub fn png(name: &str, size: usize) -> ImageUpload {
    ImageUpload {
        filename: name.to_string(),
        content_type: "image/png".to_string(),
        data: Bytes::from(vec![0x89; size]),
    }
}

/// `words` whitespace separated words wrapped in markup.
pub fn html_with_words(words: usize) -> String {
    let body = vec!["word"; words].join(" ");
    format!("<p>{body}</p>")
}
