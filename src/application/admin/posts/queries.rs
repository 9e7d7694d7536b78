use crate::application::feed::{PostView, with_tags};

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// Drafts and published posts, newest first, with their tags.
    pub async fn list_posts(&self) -> Result<Vec<PostView>, AdminPostError> {
        let posts = self.reader.list_all().await?;
        Ok(with_tags(self.post_tags.as_ref(), posts).await?)
    }
}
