use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::feed::{FeedFilter, FeedPage};
use crate::domain::post::PostType;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::posts::PostDto;
use crate::presentation::middleware::auth::MaybeUser;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct FeedQueryDto {
    pub(crate) followed: Option<bool>,
    pub(crate) liked: Option<bool>,
    pub(crate) post_type: Option<String>,
    pub(crate) author: Option<i64>,
    #[validate(range(max = 1_000_000))]
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

impl FeedQueryDto {
    fn filter(&self) -> Result<FeedFilter, DomainError> {
        let post_type = match self.post_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<PostType>()?),
        };

        Ok(FeedFilter {
            followed_only: self.followed.unwrap_or(false),
            liked_only: self.liked.unwrap_or(false),
            post_type,
            author_id: self.author,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FeedPageDto {
    pub(crate) items: Vec<PostDto>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
    pub(crate) has_next: bool,
}

impl From<FeedPage> for FeedPageDto {
    fn from(page: FeedPage) -> Self {
        let has_next = page.has_next();
        Self {
            items: page.items.into_iter().map(PostDto::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            has_next,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/feed",
    tag = "feed",
    params(
        ("followed" = Option<bool>, Query, description = "Only posts by authors the viewer follows"),
        ("liked" = Option<bool>, Query, description = "Only posts the viewer liked"),
        ("post_type" = Option<String>, Query, description = "text, image or video"),
        ("author" = Option<i64>, Query, description = "Only posts by this user"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page, clamped to the configured maximum")
    ),
    responses(
        (status = 200, description = "Feed page", body = FeedPageDto),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_feed(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<FeedQueryDto>,
) -> AppResult<(StatusCode, Json<FeedPageDto>)> {
    query.validate()?;
    let filter = query.filter()?;

    let page = state
        .feed_service
        .query_feed(viewer.identity(), filter, query.page, query.page_size)
        .await?;

    Ok((StatusCode::OK, Json(FeedPageDto::from(page))))
}
