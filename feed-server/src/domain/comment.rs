use chrono::{DateTime, Utc};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) post_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Like {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) post_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Follow {
    pub(crate) follower_id: i64,
    pub(crate) followed_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

pub(crate) fn normalize_comment_text(text: &str, max_length: usize) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "must not be empty",
        });
    }
    if text.chars().count() > max_length {
        return Err(DomainError::Validation {
            field: "text",
            message: "exceeds maximum comment length",
        });
    }
    Ok(text.to_string())
}
