use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::errors::map_db_error;
use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedEntry, FeedQuery};
use crate::domain::post::{Post, PostMetadata, PostType};

const POST_COLUMNS: &str = r#"
    p.id,
    p.title,
    p.content,
    p.author_id,
    u.username AS author_username,
    p.post_type,
    p.media_key,
    p.metadata,
    p.created_at,
    p.updated_at
"#;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    author_username: String,
    post_type: String,
    media_key: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct FeedRow {
    #[sqlx(flatten)]
    post: PostRow,
    like_count: i64,
    comment_count: i64,
    viewer_follows_author: bool,
    viewer_liked: bool,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (title, content, author_id, post_type, media_key, metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(input.title)
        .bind(input.content)
        .bind(input.author_id)
        .bind(input.post_type.as_str())
        .bind(input.media_key)
        .bind(input.metadata.to_value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post(&self, post_id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET title = $2,
                    content = $3,
                    media_key = $4,
                    metadata = $5,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(post_id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.media_key)
        .bind(patch.metadata.to_value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, DomainError> {
        let rows = feed_page_query(query)
            .build_query_as::<FeedRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::Storage)?;

        rows.into_iter().map(map_row_to_entry).collect()
    }

    async fn count_feed(&self, query: &FeedQuery) -> Result<i64, DomainError> {
        feed_count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::Storage)
    }

    async fn get_entry(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<FeedEntry>, DomainError> {
        let mut builder = feed_select(viewer_id);
        builder.push(" WHERE p.id = ").push_bind(post_id);

        let row = builder
            .build_query_as::<FeedRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::Storage)?;

        row.map(map_row_to_entry).transpose()
    }
}

fn feed_page_query<'args>(query: &FeedQuery) -> QueryBuilder<'args, Postgres> {
    let mut builder = feed_select(query.viewer_id);
    push_feed_filters(&mut builder, query);
    builder
        .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(query.page.limit())
        .push(" OFFSET ")
        .push_bind(query.page.offset());
    builder
}

fn feed_count_query<'args>(query: &FeedQuery) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
    push_feed_filters(&mut builder, query);
    builder
}

fn feed_select<'args>(viewer_id: Option<i64>) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {POST_COLUMNS}"));
    builder
        .push(", (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count")
        .push(", (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count")
        .push(", EXISTS (SELECT 1 FROM user_follows f WHERE f.followed_id = p.author_id AND f.follower_id = ")
        .push_bind(viewer_id)
        .push(") AS viewer_follows_author")
        .push(", EXISTS (SELECT 1 FROM likes vl WHERE vl.post_id = p.id AND vl.user_id = ")
        .push_bind(viewer_id)
        .push(") AS viewer_liked")
        .push(" FROM posts p JOIN users u ON u.id = p.author_id");
    builder
}

fn push_feed_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &FeedQuery) {
    builder.push(" WHERE TRUE");

    if query.filter.followed_only {
        builder
            .push(" AND p.author_id IN (SELECT followed_id FROM user_follows WHERE follower_id = ")
            .push_bind(query.viewer_id)
            .push(")");
    }
    if query.filter.liked_only {
        builder
            .push(" AND p.id IN (SELECT post_id FROM likes WHERE user_id = ")
            .push_bind(query.viewer_id)
            .push(")");
    }
    if let Some(post_type) = query.filter.post_type {
        builder.push(" AND p.post_type = ").push_bind(post_type.as_str());
    }
    if let Some(author_id) = query.filter.author_id {
        builder.push(" AND p.author_id = ").push_bind(author_id);
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    let post_type = row
        .post_type
        .parse::<PostType>()
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    let metadata = PostMetadata::from_stored(post_type, row.metadata)?;

    Ok(Post {
        id: row.id,
        title: row.title,
        content: row.content,
        author_id: row.author_id,
        author_username: row.author_username,
        post_type,
        media_key: row.media_key,
        metadata,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_row_to_entry(row: FeedRow) -> Result<FeedEntry, DomainError> {
    Ok(FeedEntry {
        post: map_row_to_post(row.post)?,
        like_count: row.like_count,
        comment_count: row.comment_count,
        viewer_follows_author: row.viewer_follows_author,
        viewer_liked: row.viewer_liked,
    })
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    map_db_error(err, "post", "author")
}
