use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::data::post_repository::{NewPost, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::limits::PostLimits;
use crate::domain::post::{MediaUpload, Post, PostType};
use crate::domain::user::Identity;
use crate::domain::validation::{PostDraft, PostValidator};
use crate::infrastructure::media_store::{MediaStore, StoredMedia};

/// Turns validated submissions into stored posts.
///
/// The media blob is written first and the post row is inserted together with
/// its media key, so a post is never visible without its file. A failed insert
/// removes the blob again.
pub(crate) struct PostFactory<R: PostRepository, M: MediaStore> {
    repo: R,
    media: M,
    validator: PostValidator,
}

impl<R: PostRepository, M: MediaStore> PostFactory<R, M> {
    pub(crate) fn new(repo: R, media: M, limits: Arc<PostLimits>) -> Self {
        Self {
            repo,
            media,
            validator: PostValidator::new(limits),
        }
    }

    pub(crate) async fn create_post(
        &self,
        author: &Identity,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let validated = self.validator.validate(&draft).inspect_err(|err| {
            debug!(author_id = author.user_id, error = %err, "post rejected");
        })?;

        let stored = match draft.media.as_ref() {
            Some(upload) if validated.post_type.requires_media() => {
                let stored = self.media.store(upload).await.map_err(|err| {
                    error!(
                        author_id = author.user_id,
                        post_type = %validated.post_type,
                        error = %err,
                        "storing post media failed"
                    );
                    creation_failed(err, "storing post media")
                })?;
                debug!(
                    author_id = author.user_id,
                    media_key = %stored.key,
                    size = stored.size,
                    "post media stored"
                );
                Some(stored)
            }
            _ => None,
        };

        let new_post = NewPost {
            title: validated.title,
            content: validated.content,
            author_id: author.user_id,
            post_type: validated.post_type,
            media_key: stored.as_ref().map(|stored| stored.key.clone()),
            metadata: validated.metadata,
        };

        match self.repo.create_post(new_post).await {
            Ok(post) => {
                info!(
                    post_id = post.id,
                    author_id = post.author_id,
                    post_type = %post.post_type,
                    "post created"
                );
                Ok(post)
            }
            Err(err) => {
                error!(
                    author_id = author.user_id,
                    post_type = %validated.post_type,
                    error = %err,
                    "inserting post failed"
                );
                if let Some(stored) = stored {
                    self.discard_media(stored).await;
                }
                Err(creation_failed(err, "inserting post"))
            }
        }
    }

    pub(crate) async fn create_text_post(
        &self,
        author: &Identity,
        title: Option<String>,
        content: String,
        metadata: Option<Value>,
    ) -> Result<Post, DomainError> {
        self.create_post(author, draft(PostType::Text, title, content, metadata, None))
            .await
    }

    pub(crate) async fn create_image_post(
        &self,
        author: &Identity,
        title: Option<String>,
        content: String,
        metadata: Option<Value>,
        media: MediaUpload,
    ) -> Result<Post, DomainError> {
        self.create_post(
            author,
            draft(PostType::Image, title, content, metadata, Some(media)),
        )
        .await
    }

    pub(crate) async fn create_video_post(
        &self,
        author: &Identity,
        title: Option<String>,
        content: String,
        metadata: Option<Value>,
        media: MediaUpload,
    ) -> Result<Post, DomainError> {
        self.create_post(
            author,
            draft(PostType::Video, title, content, metadata, Some(media)),
        )
        .await
    }

    async fn discard_media(&self, stored: StoredMedia) {
        if let Err(err) = self.media.delete(&stored.key).await {
            warn!(media_key = %stored.key, error = %err, "orphaned post media left behind");
        }
    }
}

fn draft(
    post_type: PostType,
    title: Option<String>,
    content: String,
    metadata: Option<Value>,
    media: Option<MediaUpload>,
) -> PostDraft {
    PostDraft {
        post_type: post_type.as_str().to_string(),
        title,
        content,
        metadata,
        media,
    }
}

fn creation_failed(err: DomainError, stage: &'static str) -> DomainError {
    DomainError::PostCreationFailed(anyhow::Error::new(err).context(stage))
}
