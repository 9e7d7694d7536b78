use std::sync::Arc;

use crate::application::repos::{PostTagsRepo, PostsRepo, PostsWriteRepo};
use crate::application::storage::BlobStore;

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) post_tags: Arc<dyn PostTagsRepo>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) max_image_bytes: u64,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        post_tags: Arc<dyn PostTagsRepo>,
        blobs: Arc<dyn BlobStore>,
        max_image_bytes: u64,
    ) -> Self {
        Self {
            reader,
            writer,
            post_tags,
            blobs,
            max_image_bytes,
        }
    }
}
