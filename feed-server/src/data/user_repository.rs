use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::feed::PageRequest;
use crate::domain::user::{Identity, UserProfile};

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    /// Mirrors the identity provider's view of a user into the local table.
    async fn upsert_identity(&self, identity: &Identity) -> Result<(), DomainError>;

    /// Users ordered by username, with `is_following` computed for `viewer_id`.
    async fn list_profiles(
        &self,
        viewer_id: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<UserProfile>, DomainError>;
    async fn count_users(&self) -> Result<i64, DomainError>;
    async fn get_profile(
        &self,
        user_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<UserProfile>, DomainError>;
}
