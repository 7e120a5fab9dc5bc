use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::engagement::{follow_user, unfollow_user};
use crate::presentation::handlers::users::{get_user, list_user_posts, list_users};
use crate::presentation::middleware::auth::{jwt_auth_middleware, optional_auth_middleware};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route("/{id}/posts", get(list_user_posts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let protected = Router::new()
        .route("/{id}/follow", post(follow_user).delete(unfollow_user))
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected)
}
