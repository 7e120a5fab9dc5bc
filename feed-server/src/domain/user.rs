use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    #[default]
    Member,
    Admin,
}

/// Who is making the request, as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) role: Role,
}

impl Identity {
    pub(crate) fn new(
        user_id: i64,
        username: impl Into<String>,
        role: Role,
    ) -> Result<Self, DomainError> {
        if user_id <= 0 {
            return Err(DomainError::Validation {
                field: "user_id",
                message: "must be > 0",
            });
        }
        let username = normalize_username(&username.into())?;

        Ok(Self {
            user_id,
            username,
            role,
        })
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Authors own their content; admins may write anything.
    pub(crate) fn can_modify(&self, author_id: i64) -> bool {
        self.user_id == author_id || self.is_admin()
    }
}

/// A user as listed in the directory, with follow counts and whether the
/// viewer follows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserProfile {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) follower_count: i64,
    pub(crate) following_count: i64,
    pub(crate) post_count: i64,
    pub(crate) is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserPage {
    pub(crate) items: Vec<UserProfile>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

impl UserPage {
    pub(crate) fn has_next(&self) -> bool {
        i64::from(self.page) * i64::from(self.page_size) < self.total
    }
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 150 {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 1..150 chars",
        });
    }
    Ok(username.to_string())
}
