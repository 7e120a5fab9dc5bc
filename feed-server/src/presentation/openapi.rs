use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::engagement::{CommentBodyDto, CommentDto, FollowDto, LikeDto};
use crate::presentation::handlers::feed::{FeedPageDto, FeedQueryDto};
use crate::presentation::handlers::posts::{PostDto, PostFormDto};
use crate::presentation::handlers::users::{PageQueryDto, UserDto, UserPageDto, UserPostsQueryDto};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::feed::get_feed,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::update_post,
        crate::presentation::handlers::posts::delete_post,
        crate::presentation::handlers::engagement::list_likes,
        crate::presentation::handlers::engagement::like_post,
        crate::presentation::handlers::engagement::unlike_post,
        crate::presentation::handlers::engagement::list_comments,
        crate::presentation::handlers::engagement::create_comment,
        crate::presentation::handlers::engagement::update_comment,
        crate::presentation::handlers::engagement::delete_comment,
        crate::presentation::handlers::engagement::follow_user,
        crate::presentation::handlers::engagement::unfollow_user,
        crate::presentation::handlers::users::list_users,
        crate::presentation::handlers::users::get_user,
        crate::presentation::handlers::users::list_user_posts
    ),
    components(
        schemas(
            FeedQueryDto,
            FeedPageDto,
            PostFormDto,
            PostDto,
            CommentBodyDto,
            CommentDto,
            LikeDto,
            FollowDto,
            PageQueryDto,
            UserPostsQueryDto,
            UserDto,
            UserPageDto
        )
    ),
    tags(
        (name = "feed", description = "Personalized post feed"),
        (name = "posts", description = "Post endpoints"),
        (name = "engagement", description = "Likes, comments and follows"),
        (name = "users", description = "User directory and profiles")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
