use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::engagement_service::EngagementService;
use crate::application::feed_service::FeedService;
use crate::application::post_factory::PostFactory;
use crate::application::post_service::PostService;
use crate::application::user_service::UserService;
use crate::data::repositories::postgres::engagement_repository::PostgresEngagementRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::media_store::LocalMediaStore;
use crate::infrastructure::settings::Settings;
use crate::presentation::middleware::cors::apply_cors;
use crate::presentation::middleware::trace::apply_trace;
use crate::presentation::openapi::ApiDoc;
use crate::presentation::{AppState, routes};

pub(crate) async fn build_state(pool: PgPool, settings: &Settings) -> anyhow::Result<AppState> {
    let limits = Arc::new(settings.post_limits());
    let media = LocalMediaStore::new(&settings.media_dir)
        .await
        .context("failed to prepare media directory")?;
    let posts = PostgresPostRepository::new(pool.clone());
    let users = PostgresUserRepository::new(pool.clone());

    Ok(AppState {
        post_factory: Arc::new(PostFactory::new(posts.clone(), media.clone(), limits.clone())),
        post_service: Arc::new(PostService::new(posts.clone(), media, limits.clone())),
        feed_service: Arc::new(FeedService::new(posts, limits.clone())),
        engagement_service: Arc::new(EngagementService::new(
            PostgresEngagementRepository::new(pool),
            limits.clone(),
        )),
        user_service: Arc::new(UserService::new(users.clone(), limits)),
        users: Arc::new(users),
        jwt: Arc::new(JwtService::new(&settings.jwt_secret)),
    })
}

pub(crate) async fn run_http(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, settings)?;

    let listener = TcpListener::bind(&settings.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.http_addr))?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub(crate) fn build_router(state: AppState, settings: &Settings) -> anyhow::Result<Router> {
    let app = routes::router(state)
        .nest_service("/media", ServeDir::new(&settings.media_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(settings.http_request_timeout_secs),
                ))
                .layer(DefaultBodyLimit::max(settings.http_request_body_limit_bytes())),
        );
    let app = apply_trace(app);
    apply_cors(app, &settings.cors_origins)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
