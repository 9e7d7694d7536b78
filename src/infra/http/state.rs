use std::sync::Arc;

use async_trait::async_trait;

use crate::application::{
    admin::{AdminFounderService, AdminGalleryService, AdminPostService, AdminTagService},
    auth::AdminAuthService,
    feed::FeedService,
    storage::BlobStore,
};
use crate::infra::db::PostgresRepositories;

/// Readiness probe behind `GET /health`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<(), String>;
}

#[async_trait]
impl HealthCheck for PostgresRepositories {
    async fn check(&self) -> Result<(), String> {
        self.health_check().await.map_err(|err| err.to_string())
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<AdminPostService>,
    pub tags: Arc<AdminTagService>,
    pub founders: Arc<AdminFounderService>,
    pub gallery: Arc<AdminGalleryService>,
    pub auth: Arc<AdminAuthService>,
    pub blobs: Arc<dyn BlobStore>,
    pub health: Arc<dyn HealthCheck>,
    pub max_request_bytes: usize,
}
