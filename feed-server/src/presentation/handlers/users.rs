use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::feed::FeedFilter;
use crate::domain::post::PostType;
use crate::domain::user::{UserPage, UserProfile};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::feed::FeedPageDto;
use crate::presentation::middleware::auth::MaybeUser;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct PageQueryDto {
    #[validate(range(max = 1_000_000))]
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct UserPostsQueryDto {
    pub(crate) post_type: Option<String>,
    #[validate(range(max = 1_000_000))]
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) follower_count: i64,
    pub(crate) following_count: i64,
    pub(crate) post_count: i64,
    pub(crate) is_following: bool,
}

impl From<UserProfile> for UserDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            follower_count: profile.follower_count,
            following_count: profile.following_count,
            post_count: profile.post_count,
            is_following: profile.is_following,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserPageDto {
    pub(crate) items: Vec<UserDto>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
    pub(crate) has_next: bool,
}

impl From<UserPage> for UserPageDto {
    fn from(page: UserPage) -> Self {
        let has_next = page.has_next();
        Self {
            items: page.items.into_iter().map(UserDto::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            has_next,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page, clamped to the configured maximum")
    ),
    responses(
        (status = 200, description = "Users ordered by username", body = UserPageDto),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<PageQueryDto>,
) -> AppResult<(StatusCode, Json<UserPageDto>)> {
    query.validate()?;
    let page = state
        .user_service
        .list_users(viewer.identity(), query.page, query.page_size)
        .await?;

    Ok((StatusCode::OK, Json(UserPageDto::from(page))))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserDto),
        (status = 401, description = "Invalid token"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let profile = state.user_service.get_user(viewer.identity(), id).await?;
    Ok((StatusCode::OK, Json(UserDto::from(profile))))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/posts",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author id"),
        ("post_type" = Option<String>, Query, description = "text, image or video"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page, clamped to the configured maximum")
    ),
    responses(
        (status = 200, description = "The user's posts, newest first", body = FeedPageDto),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn list_user_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
    Query(query): Query<UserPostsQueryDto>,
) -> AppResult<(StatusCode, Json<FeedPageDto>)> {
    query.validate()?;
    let post_type = match query.post_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<PostType>().map_err(DomainError::from)?),
    };

    state.user_service.get_user(viewer.identity(), id).await?;
    let filter = FeedFilter {
        post_type,
        author_id: Some(id),
        ..FeedFilter::default()
    };
    let page = state
        .feed_service
        .query_feed(viewer.identity(), filter, query.page, query.page_size)
        .await?;

    Ok((StatusCode::OK, Json(FeedPageDto::from(page))))
}

#[cfg(test)]
mod tests {
    use super::{UserDto, UserPageDto};
    use crate::domain::user::{UserPage, UserProfile};

    fn profile(id: i64, username: &str) -> UserProfile {
        UserProfile {
            id,
            username: username.to_string(),
            follower_count: 2,
            following_count: 1,
            post_count: 4,
            is_following: true,
        }
    }

    #[test]
    fn page_dto_reports_next_page() {
        let dto = UserPageDto::from(UserPage {
            items: vec![profile(1, "alice"), profile(2, "bob")],
            page: 1,
            page_size: 2,
            total: 3,
        });

        assert!(dto.has_next);
        assert_eq!(dto.items.len(), 2);
        assert_eq!(dto.items[1].username, "bob");
    }

    #[test]
    fn user_dto_serializes_counts() {
        let json = serde_json::to_value(UserDto::from(profile(7, "carol")))
            .expect("dto must serialize");

        assert_eq!(json["id"], 7);
        assert_eq!(json["follower_count"], 2);
        assert_eq!(json["following_count"], 1);
        assert_eq!(json["is_following"], true);
    }
}
