use async_trait::async_trait;

use crate::domain::comment::{Comment, Follow, Like};
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) post_id: i64,
}

/// Likes, follows and comments. Pair uniqueness is the store's job: inserts
/// fail with `AlreadyExists` instead of being checked beforehand.
#[async_trait]
pub(crate) trait EngagementRepository: Send + Sync {
    async fn insert_like(&self, user_id: i64, post_id: i64) -> Result<Like, DomainError>;
    async fn delete_like(&self, user_id: i64, post_id: i64) -> Result<bool, DomainError>;
    async fn list_likes(&self, post_id: i64) -> Result<Vec<Like>, DomainError>;

    async fn insert_follow(&self, follower_id: i64, followed_id: i64) -> Result<Follow, DomainError>;
    async fn delete_follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, DomainError>;

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError>;
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError>;
    async fn update_comment_text(&self, id: i64, text: String)
    -> Result<Option<Comment>, DomainError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError>;
}
