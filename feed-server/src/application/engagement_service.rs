use std::sync::Arc;

use tracing::info;

use crate::data::engagement_repository::{EngagementRepository, NewComment};
use crate::domain::comment::{Comment, Follow, Like, normalize_comment_text};
use crate::domain::error::DomainError;
use crate::domain::limits::PostLimits;
use crate::domain::user::Identity;

/// Likes, follows and comments.
pub(crate) struct EngagementService<E: EngagementRepository> {
    repo: E,
    limits: Arc<PostLimits>,
}

impl<E: EngagementRepository> EngagementService<E> {
    pub(crate) fn new(repo: E, limits: Arc<PostLimits>) -> Self {
        Self { repo, limits }
    }

    pub(crate) async fn like_post(&self, user: &Identity, post_id: i64) -> Result<Like, DomainError> {
        let like = self.repo.insert_like(user.user_id, post_id).await?;
        info!(post_id, user_id = user.user_id, "post liked");
        Ok(like)
    }

    pub(crate) async fn unlike_post(&self, user: &Identity, post_id: i64) -> Result<(), DomainError> {
        if !self.repo.delete_like(user.user_id, post_id).await? {
            return Err(DomainError::NotFound(format!("like on post id: {post_id}")));
        }
        Ok(())
    }

    pub(crate) async fn list_likes(&self, post_id: i64) -> Result<Vec<Like>, DomainError> {
        self.repo.list_likes(post_id).await
    }

    pub(crate) async fn follow_user(
        &self,
        follower: &Identity,
        followed_id: i64,
    ) -> Result<Follow, DomainError> {
        if follower.user_id == followed_id {
            return Err(DomainError::Validation {
                field: "user_id",
                message: "users cannot follow themselves",
            });
        }

        let follow = self.repo.insert_follow(follower.user_id, followed_id).await?;
        info!(follower_id = follower.user_id, followed_id, "user followed");
        Ok(follow)
    }

    pub(crate) async fn unfollow_user(
        &self,
        follower: &Identity,
        followed_id: i64,
    ) -> Result<(), DomainError> {
        if !self.repo.delete_follow(follower.user_id, followed_id).await? {
            return Err(DomainError::NotFound(format!("follow of user id: {followed_id}")));
        }
        Ok(())
    }

    /// Oldest first.
    pub(crate) async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.repo.list_comments(post_id).await
    }

    pub(crate) async fn create_comment(
        &self,
        author: &Identity,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let text = normalize_comment_text(text, self.limits.max_comment_length)?;
        self.repo
            .create_comment(NewComment {
                text,
                author_id: author.user_id,
                post_id,
            })
            .await
    }

    pub(crate) async fn update_comment(
        &self,
        actor: &Identity,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let text = normalize_comment_text(text, self.limits.max_comment_length)?;
        self.owned_comment(actor, comment_id).await?;

        self.repo
            .update_comment_text(comment_id, text)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("comment id: {comment_id}")))
    }

    pub(crate) async fn delete_comment(
        &self,
        actor: &Identity,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        self.owned_comment(actor, comment_id).await?;

        if !self.repo.delete_comment(comment_id).await? {
            return Err(DomainError::NotFound(format!("comment id: {comment_id}")));
        }
        Ok(())
    }

    async fn owned_comment(&self, actor: &Identity, comment_id: i64) -> Result<Comment, DomainError> {
        let comment = self
            .repo
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("comment id: {comment_id}")))?;

        if !actor.can_modify(comment.author_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(comment)
    }
}
