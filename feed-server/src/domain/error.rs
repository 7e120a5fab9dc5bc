use thiserror::Error;

use super::limits::ByteSize;
use super::post::PostType;

/// Rejections produced by the post validator, in the order they are checked.
#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum PostValidationError {
    #[error("invalid post type '{given}'. Allowed types: {}", PostType::allowed_list())]
    InvalidPostType { given: String },

    #[error("post content is {length} characters long, maximum allowed is {max}")]
    ContentTooLong { length: usize, max: usize },

    #[error("post title is {length} characters long, maximum allowed is {max}")]
    TitleTooLong { length: usize, max: usize },

    #[error("invalid metadata format: {reason}")]
    InvalidMetadataFormat { reason: String },

    #[error("{post_type} posts require a media file")]
    MediaRequired { post_type: PostType },

    #[error("file size of {size} bytes exceeds maximum limit of {max}")]
    FileTooLarge { size: u64, max: ByteSize },

    #[error("invalid image format '{extension}'. Allowed formats: png, jpg, jpeg, gif, webp")]
    InvalidImageFormat { extension: String },

    #[error("invalid video format '{extension}'. Allowed formats: mp4, mov, avi, wmv, webm")]
    InvalidVideoFormat { extension: String },
}

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error(transparent)]
    Post(#[from] PostValidationError),

    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("forbidden")]
    Forbidden,

    #[error("post creation failed: {0:#}")]
    PostCreationFailed(#[source] anyhow::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("media storage error: {0}")]
    MediaStorage(#[from] std::io::Error),

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}
