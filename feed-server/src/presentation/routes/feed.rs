use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::handlers::feed::get_feed;
use crate::presentation::middleware::auth::optional_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_feed))
        .layer(middleware::from_fn_with_state(state, optional_auth_middleware))
}
