use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::comment::{Comment, Follow, Like};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::{AuthenticatedUser, MaybeUser};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CommentBodyDto {
    #[validate(length(min = 1))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) post_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author_id: comment.author_id,
            author_username: comment.author_username,
            post_id: comment.post_id,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LikeDto {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) post_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Like> for LikeDto {
    fn from(like: Like) -> Self {
        Self {
            user_id: like.user_id,
            username: like.username,
            post_id: like.post_id,
            created_at: like.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FollowDto {
    pub(crate) follower_id: i64,
    pub(crate) followed_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Follow> for FollowDto {
    fn from(follow: Follow) -> Self {
        Self {
            follower_id: follow.follower_id,
            followed_id: follow.followed_id,
            created_at: follow.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/likes",
    tag = "engagement",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Likes, newest first", body = [LikeDto]),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn list_likes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(post_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Vec<LikeDto>>)> {
    state.post_service.get_post(viewer.identity(), post_id).await?;
    let likes = state.engagement_service.list_likes(post_id).await?;

    Ok((
        StatusCode::OK,
        Json(likes.into_iter().map(LikeDto::from).collect()),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 201, description = "Post liked", body = LikeDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Already liked")
    )
)]
pub(crate) async fn like_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<(StatusCode, Json<LikeDto>)> {
    let like = state.engagement_service.like_post(&user, post_id).await?;
    Ok((StatusCode::CREATED, Json(LikeDto::from(like))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not liked")
    )
)]
pub(crate) async fn unlike_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.engagement_service.unlike_post(&user, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "engagement",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [CommentDto]),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(post_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Vec<CommentDto>>)> {
    state.post_service.get_post(viewer.identity(), post_id).await?;
    let comments = state.engagement_service.list_comments(post_id).await?;

    Ok((
        StatusCode::OK,
        Json(comments.into_iter().map(CommentDto::from).collect()),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body = CommentBodyDto,
    responses(
        (status = 201, description = "Comment created", body = CommentDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(author): AuthenticatedUser,
    Path(post_id): Path<i64>,
    Json(dto): Json<CommentBodyDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;
    let comment = state
        .engagement_service
        .create_comment(&author, post_id, &dto.text)
        .await?;

    Ok((StatusCode::CREATED, Json(CommentDto::from(comment))))
}

#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Comment id")),
    request_body = CommentBodyDto,
    responses(
        (status = 200, description = "Comment updated", body = CommentDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Comment not found")
    )
)]
pub(crate) async fn update_comment(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(dto): Json<CommentBodyDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;
    let comment = state
        .engagement_service
        .update_comment(&actor, id, &dto.text)
        .await?;

    Ok((StatusCode::OK, Json(CommentDto::from(comment))))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Comment not found")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.engagement_service.delete_comment(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User to follow")),
    responses(
        (status = 201, description = "User followed", body = FollowDto),
        (status = 400, description = "Cannot follow yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already following")
    )
)]
pub(crate) async fn follow_user(
    State(state): State<AppState>,
    AuthenticatedUser(follower): AuthenticatedUser,
    Path(followed_id): Path<i64>,
) -> AppResult<(StatusCode, Json<FollowDto>)> {
    let follow = state
        .engagement_service
        .follow_user(&follower, followed_id)
        .await?;
    Ok((StatusCode::CREATED, Json(FollowDto::from(follow))))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/follow",
    tag = "engagement",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "User unfollowed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not following")
    )
)]
pub(crate) async fn unfollow_user(
    State(state): State<AppState>,
    AuthenticatedUser(follower): AuthenticatedUser,
    Path(followed_id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .engagement_service
        .unfollow_user(&follower, followed_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
