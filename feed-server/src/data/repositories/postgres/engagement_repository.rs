use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::errors::map_db_error;
use crate::data::engagement_repository::{EngagementRepository, NewComment};
use crate::domain::comment::{Comment, Follow, Like};
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub(crate) struct PostgresEngagementRepository {
    pool: PgPool,
}

impl PostgresEngagementRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    user_id: i64,
    username: String,
    post_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct FollowRow {
    follower_id: i64,
    followed_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    author_id: i64,
    author_username: String,
    post_id: i64,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl EngagementRepository for PostgresEngagementRepository {
    async fn insert_like(&self, user_id: i64, post_id: i64) -> Result<Like, DomainError> {
        let row = sqlx::query_as::<_, LikeRow>(
            r#"
            WITH l AS (
                INSERT INTO likes (user_id, post_id)
                VALUES ($1, $2)
                RETURNING user_id, post_id, created_at
            )
            SELECT l.user_id, u.username, l.post_id, l.created_at
            FROM l
            JOIN users u ON u.id = l.user_id
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_db_error(err, "like", "post"))?;

        Ok(map_like_row(row))
    }

    async fn delete_like(&self, user_id: i64, post_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_likes(&self, post_id: i64) -> Result<Vec<Like>, DomainError> {
        let rows = sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT l.user_id, u.username, l.post_id, l.created_at
            FROM likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.post_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(rows.into_iter().map(map_like_row).collect())
    }

    async fn insert_follow(&self, follower_id: i64, followed_id: i64) -> Result<Follow, DomainError> {
        let row = sqlx::query_as::<_, FollowRow>(
            r#"
            INSERT INTO user_follows (follower_id, followed_id)
            VALUES ($1, $2)
            RETURNING follower_id, followed_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_db_error(err, "follow", "user"))?;

        Ok(Follow {
            follower_id: row.follower_id,
            followed_id: row.followed_id,
            created_at: row.created_at,
        })
    }

    async fn delete_follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_follows
            WHERE follower_id = $1 AND followed_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.text, c.author_id, u.username AS author_username, c.post_id, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(rows.into_iter().map(map_comment_row).collect())
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.text, c.author_id, u.username AS author_username, c.post_id, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(row.map(map_comment_row))
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH c AS (
                INSERT INTO comments (text, author_id, post_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, author_id, post_id, created_at
            )
            SELECT c.id, c.text, c.author_id, u.username AS author_username, c.post_id, c.created_at
            FROM c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(input.text)
        .bind(input.author_id)
        .bind(input.post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_db_error(err, "comment", "post"))?;

        Ok(map_comment_row(row))
    }

    async fn update_comment_text(
        &self,
        id: i64,
        text: String,
    ) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH c AS (
                UPDATE comments
                SET text = $2
                WHERE id = $1
                RETURNING id, text, author_id, post_id, created_at
            )
            SELECT c.id, c.text, c.author_id, u.username AS author_username, c.post_id, c.created_at
            FROM c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(row.map(map_comment_row))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DomainError::Storage)?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_like_row(row: LikeRow) -> Like {
    Like {
        user_id: row.user_id,
        username: row.username,
        post_id: row.post_id,
        created_at: row.created_at,
    }
}

fn map_comment_row(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        text: row.text,
        author_id: row.author_id,
        author_username: row.author_username,
        post_id: row.post_id,
        created_at: row.created_at,
    }
}
