use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::data::post_repository::{PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::limits::PostLimits;
use crate::domain::post::{MediaUpload, Post, PostMetadata, PostView};
use crate::domain::user::Identity;
use crate::domain::validation::{PostValidator, parse_metadata};
use crate::infrastructure::media_store::MediaStore;

/// Changes requested for an existing post. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub(crate) struct PostEdit {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) metadata: Option<Value>,
    pub(crate) media: Option<MediaUpload>,
}

pub(crate) struct PostService<R: PostRepository, M: MediaStore> {
    repo: R,
    media: M,
    validator: PostValidator,
}

impl<R: PostRepository, M: MediaStore> PostService<R, M> {
    pub(crate) fn new(repo: R, media: M, limits: Arc<PostLimits>) -> Self {
        Self {
            repo,
            media,
            validator: PostValidator::new(limits),
        }
    }

    pub(crate) async fn get_post(
        &self,
        viewer: Option<&Identity>,
        id: i64,
    ) -> Result<PostView, DomainError> {
        self.repo
            .get_entry(id, viewer.map(|viewer| viewer.user_id))
            .await?
            .map(|entry| entry.into_view(viewer))
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))
    }

    /// The post type never changes. Derived file attributes are only
    /// recomputed when a new media file replaces the old one.
    pub(crate) async fn update_post(
        &self,
        actor: &Identity,
        post_id: i64,
        edit: PostEdit,
    ) -> Result<PostView, DomainError> {
        let original = self.owned_post(actor, post_id).await?;

        let content = edit.content.unwrap_or_else(|| original.content.clone());
        self.validator.check_content(&content)?;
        let title = self
            .validator
            .normalize_title(Some(edit.title.as_deref().unwrap_or(&original.title)))?;
        let extra = edit
            .metadata
            .as_ref()
            .map(|raw| parse_metadata(Some(raw)))
            .transpose()?;

        let replacement = match edit.media.as_ref() {
            Some(upload) if original.post_type.requires_media() => self
                .validator
                .inspect_media(original.post_type, Some(upload))?
                .map(|file| (upload, file)),
            _ => None,
        };

        let (metadata, media_key, new_key) = match replacement {
            Some((upload, file)) => {
                let extra = extra.unwrap_or_else(|| original.metadata.clone().into_map());
                let metadata = PostMetadata::compose(original.post_type, extra, Some(file))?;
                let stored = self.media.store(upload).await?;
                (metadata, Some(stored.key.clone()), Some(stored.key))
            }
            None => {
                let metadata = match extra {
                    Some(extra) => original.metadata.clone().with_extra(extra)?,
                    None => original.metadata.clone(),
                };
                (metadata, original.media_key.clone(), None)
            }
        };

        let patch = PostPatch {
            title,
            content,
            media_key,
            metadata,
        };
        let updated = match self.repo.update_post(post_id, patch).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                self.discard_media(new_key.as_deref()).await;
                return Err(DomainError::NotFound(format!("post id: {post_id}")));
            }
            Err(err) => {
                self.discard_media(new_key.as_deref()).await;
                return Err(err);
            }
        };

        if new_key.is_some() {
            self.discard_media(original.media_key.as_deref()).await;
        }
        info!(post_id, actor_id = actor.user_id, "post updated");

        self.get_post(Some(actor), updated.id).await
    }

    pub(crate) async fn delete_post(&self, actor: &Identity, post_id: i64) -> Result<(), DomainError> {
        let original = self.owned_post(actor, post_id).await?;

        let deleted = self.repo.delete_post(post_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }

        self.discard_media(original.media_key.as_deref()).await;
        info!(post_id, actor_id = actor.user_id, "post deleted");
        Ok(())
    }

    async fn owned_post(&self, actor: &Identity, post_id: i64) -> Result<Post, DomainError> {
        let post = self
            .repo
            .get_post(post_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))?;

        if !actor.can_modify(post.author_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    async fn discard_media(&self, key: Option<&str>) {
        let Some(key) = key else {
            return;
        };
        if let Err(err) = self.media.delete(key).await {
            warn!(media_key = %key, error = %err, "failed to remove post media");
        }
    }
}
