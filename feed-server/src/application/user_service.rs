use std::sync::Arc;

use tracing::error;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::feed::PageRequest;
use crate::domain::limits::PostLimits;
use crate::domain::user::{Identity, UserPage, UserProfile};

/// Read side of the user directory.
pub(crate) struct UserService<U: UserRepository> {
    repo: U,
    limits: Arc<PostLimits>,
}

impl<U: UserRepository> UserService<U> {
    pub(crate) fn new(repo: U, limits: Arc<PostLimits>) -> Self {
        Self { repo, limits }
    }

    pub(crate) async fn list_users(
        &self,
        viewer: Option<&Identity>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<UserPage, DomainError> {
        let page = PageRequest::resolve(page, page_size, &self.limits);
        let viewer_id = viewer.map(|viewer| viewer.user_id);

        let items = self
            .repo
            .list_profiles(viewer_id, page)
            .await
            .inspect_err(|err| error!(viewer_id = ?viewer_id, error = %err, "user listing failed"))?;
        let total = self.repo.count_users().await?;

        Ok(UserPage {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }

    pub(crate) async fn get_user(
        &self,
        viewer: Option<&Identity>,
        user_id: i64,
    ) -> Result<UserProfile, DomainError> {
        self.repo
            .get_profile(user_id, viewer.map(|viewer| viewer.user_id))
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))
    }
}
