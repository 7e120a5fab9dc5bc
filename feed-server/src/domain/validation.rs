//! The single place where post submissions are judged.
//!
//! Checks run in a fixed order so that the first applicable violation is the
//! one reported: post type, content length, title length, metadata format,
//! media presence, media size, media format.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::PostValidationError;
use super::limits::PostLimits;
use super::post::{
    DEFAULT_TITLE, FileAttributes, MAX_TITLE_LENGTH, MediaUpload, PostMetadata, PostType,
    parse_duration,
};

/// A post submission as received from the caller, nothing checked yet.
#[derive(Debug, Clone)]
pub(crate) struct PostDraft {
    pub(crate) post_type: String,
    pub(crate) title: Option<String>,
    pub(crate) content: String,
    pub(crate) metadata: Option<Value>,
    pub(crate) media: Option<MediaUpload>,
}

/// A submission that passed every rule, with normalized title and metadata.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedPost {
    pub(crate) post_type: PostType,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) metadata: PostMetadata,
}

#[derive(Debug, Clone)]
pub(crate) struct PostValidator {
    limits: Arc<PostLimits>,
}

impl PostValidator {
    pub(crate) fn new(limits: Arc<PostLimits>) -> Self {
        Self { limits }
    }

    pub(crate) fn validate(&self, draft: &PostDraft) -> Result<ValidatedPost, PostValidationError> {
        let post_type: PostType = draft.post_type.trim().parse()?;
        self.check_content(&draft.content)?;
        let title = self.normalize_title(draft.title.as_deref())?;
        let extra = parse_metadata(draft.metadata.as_ref())?;
        if post_type == PostType::Video {
            parse_duration(extra.get(PostMetadata::DURATION))?;
        }
        let file = self.inspect_media(post_type, draft.media.as_ref())?;
        let metadata = PostMetadata::compose(post_type, extra, file)?;

        Ok(ValidatedPost {
            post_type,
            title,
            content: draft.content.clone(),
            metadata,
        })
    }

    pub(crate) fn check_content(&self, content: &str) -> Result<(), PostValidationError> {
        let length = content.chars().count();
        if length > self.limits.max_post_length {
            return Err(PostValidationError::ContentTooLong {
                length,
                max: self.limits.max_post_length,
            });
        }
        Ok(())
    }

    /// Blank or missing titles fall back to the default title.
    pub(crate) fn normalize_title(&self, title: Option<&str>) -> Result<String, PostValidationError> {
        let title = title.map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Ok(DEFAULT_TITLE.to_string());
        }

        let length = title.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(PostValidationError::TitleTooLong {
                length,
                max: MAX_TITLE_LENGTH,
            });
        }
        Ok(title.to_string())
    }

    /// Media presence, size and format for `post_type`. Text posts never carry
    /// media, so whatever was attached to them is ignored.
    pub(crate) fn inspect_media(
        &self,
        post_type: PostType,
        media: Option<&MediaUpload>,
    ) -> Result<Option<FileAttributes>, PostValidationError> {
        if !post_type.requires_media() {
            return Ok(None);
        }

        let media = media.ok_or(PostValidationError::MediaRequired { post_type })?;

        let size = media.size();
        if size > self.limits.max_file_size_bytes {
            return Err(PostValidationError::FileTooLarge {
                size,
                max: self.limits.max_file_size(),
            });
        }

        let extension = media.extension();
        if !post_type.allowed_extensions().contains(&extension.as_str()) {
            return Err(match post_type {
                PostType::Video => PostValidationError::InvalidVideoFormat { extension },
                _ => PostValidationError::InvalidImageFormat { extension },
            });
        }

        Ok(Some(FileAttributes {
            file_size: size,
            file_type: extension,
            content_type: media.content_type.clone().filter(|value| !value.is_empty()),
        }))
    }
}

/// Accepts a JSON object, a string holding a serialized JSON object, or
/// nothing at all (treated as an empty object).
pub(crate) fn parse_metadata(raw: Option<&Value>) -> Result<Map<String, Value>, PostValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PostValidationError::InvalidMetadataFormat {
                reason: "metadata must be a JSON object".to_string(),
            }),
            Err(err) => Err(PostValidationError::InvalidMetadataFormat {
                reason: format!("metadata is not valid JSON: {err}"),
            }),
        },
        Some(_) => Err(PostValidationError::InvalidMetadataFormat {
            reason: "metadata must be a JSON object".to_string(),
        }),
    }
}
