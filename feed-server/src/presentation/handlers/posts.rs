use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::application::post_service::PostEdit;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostType, PostView};
use crate::domain::validation::PostDraft;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::form::read_post_form;
use crate::presentation::middleware::auth::{AuthenticatedUser, MaybeUser};

/// Multipart form accepted by the create and update endpoints.
#[allow(dead_code)]
#[derive(ToSchema)]
pub(crate) struct PostFormDto {
    /// `text`, `image` or `video`. Ignored on update.
    post_type: Option<String>,
    title: Option<String>,
    content: Option<String>,
    /// A JSON object serialized as a string.
    metadata: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    media: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) post_type: String,
    pub(crate) media_url: Option<String>,
    #[schema(value_type = Object)]
    pub(crate) metadata: Value,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) can_edit: bool,
    pub(crate) is_following_author: bool,
    pub(crate) liked_by_viewer: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<PostView> for PostDto {
    fn from(view: PostView) -> Self {
        let post = view.post;
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author_username: post.author_username,
            post_type: post.post_type.as_str().to_string(),
            media_url: post.media_key.map(|key| format!("/media/{key}")),
            metadata: Value::Object(post.metadata.into_map()),
            like_count: view.like_count,
            comment_count: view.comment_count,
            can_edit: view.can_edit,
            is_following_author: view.is_following_author,
            liked_by_viewer: view.liked_by_viewer,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// A post its author has just created: no likes, comments or follows yet.
fn created_view(post: Post) -> PostView {
    PostView {
        post,
        like_count: 0,
        comment_count: 0,
        can_edit: true,
        is_following_author: false,
        liked_by_viewer: false,
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 401, description = "Invalid token"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let view = state.post_service.get_post(viewer.identity(), id).await?;

    Ok((StatusCode::OK, Json(PostDto::from(view))))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body(content = PostFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Post could not be created")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(author): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let form = read_post_form(multipart).await?;
    let post_type: PostType = form
        .post_type
        .as_deref()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(DomainError::from)?;
    let content = form.content.unwrap_or_default();
    let factory = &state.post_factory;

    let post = match (post_type, form.media) {
        (PostType::Text, _) => {
            factory
                .create_text_post(&author, form.title, content, form.metadata)
                .await?
        }
        (PostType::Image, Some(media)) => {
            factory
                .create_image_post(&author, form.title, content, form.metadata, media)
                .await?
        }
        (PostType::Video, Some(media)) => {
            factory
                .create_video_post(&author, form.title, content, form.metadata, media)
                .await?
        }
        // Missing media is reported by the validator, after the content checks.
        (post_type, None) => {
            factory
                .create_post(
                    &author,
                    PostDraft {
                        post_type: post_type.as_str().to_string(),
                        title: form.title,
                        content,
                        metadata: form.metadata,
                        media: None,
                    },
                )
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(PostDto::from(created_view(post)))))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body(content = PostFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let form = read_post_form(multipart).await?;
    let edit = PostEdit {
        title: form.title,
        content: form.content,
        metadata: form.metadata,
        media: form.media,
    };

    let view = state.post_service.update_post(&actor, id, edit).await?;
    Ok((StatusCode::OK, Json(PostDto::from(view))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.post_service.delete_post(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
