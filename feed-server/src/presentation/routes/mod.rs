use axum::Router;
use axum::routing::get;

use super::AppState;
use super::handlers::health::healthz;

pub(crate) mod comments;
pub(crate) mod feed;
pub(crate) mod posts;
pub(crate) mod users;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/feed", feed::router(state.clone()))
        .nest("/api/posts", posts::router(state.clone()))
        .nest("/api/comments", comments::router(state.clone()))
        .nest("/api/users", users::router(state.clone()))
        .with_state(state)
}
