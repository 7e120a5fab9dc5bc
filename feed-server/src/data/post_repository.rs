use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::feed::{FeedEntry, FeedQuery};
use crate::domain::post::{Post, PostMetadata, PostType};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) post_type: PostType,
    pub(crate) media_key: Option<String>,
    pub(crate) metadata: PostMetadata,
}

/// Replacement values for the mutable columns of a post.
#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) media_key: Option<String>,
    pub(crate) metadata: PostMetadata,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    /// Inserts the post together with its media reference in one statement.
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update_post(&self, post_id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;

    /// One page of the feed, newest first, with per-post aggregates.
    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, DomainError>;
    async fn count_feed(&self, query: &FeedQuery) -> Result<i64, DomainError>;
    async fn get_entry(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<FeedEntry>, DomainError>;
}
