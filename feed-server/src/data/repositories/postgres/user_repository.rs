use async_trait::async_trait;
use sqlx::PgPool;

use super::errors::map_db_error;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::feed::PageRequest;
use crate::domain::user::{Identity, UserProfile};

/// `$1` is the viewer id, NULL for anonymous requests.
const PROFILE_SELECT: &str = r#"
    SELECT
        u.id,
        u.username,
        (SELECT COUNT(*) FROM user_follows f WHERE f.followed_id = u.id) AS follower_count,
        (SELECT COUNT(*) FROM user_follows f WHERE f.follower_id = u.id) AS following_count,
        (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
        EXISTS (
            SELECT 1 FROM user_follows f
            WHERE f.followed_id = u.id AND f.follower_id = $1
        ) AS is_following
    FROM users u
"#;

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    username: String,
    follower_count: i64,
    following_count: i64,
    post_count: i64,
    is_following: bool,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            follower_count: row.follower_count,
            following_count: row.following_count,
            post_count: row.post_count,
            is_following: row.is_following,
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_identity(&self, identity: &Identity) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, is_admin)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                is_admin = EXCLUDED.is_admin
            WHERE users.username IS DISTINCT FROM EXCLUDED.username
               OR users.is_admin IS DISTINCT FROM EXCLUDED.is_admin
            "#,
        )
        .bind(identity.user_id)
        .bind(&identity.username)
        .bind(identity.is_admin())
        .execute(&self.pool)
        .await
        .map_err(|err| map_db_error(err, "user", "user"))?;

        Ok(())
    }

    async fn list_profiles(
        &self,
        viewer_id: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            {PROFILE_SELECT}
            ORDER BY u.username ASC, u.id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(viewer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    async fn count_users(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::Storage)
    }

    async fn get_profile(
        &self,
        user_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<UserProfile>, DomainError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            {PROFILE_SELECT}
            WHERE u.id = $2
            "#
        ))
        .bind(viewer_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(row.map(UserProfile::from))
    }
}
