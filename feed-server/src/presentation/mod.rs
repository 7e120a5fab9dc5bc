use std::sync::Arc;

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

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) post_factory: Arc<PostFactory<PostgresPostRepository, LocalMediaStore>>,
    pub(crate) post_service: Arc<PostService<PostgresPostRepository, LocalMediaStore>>,
    pub(crate) feed_service: Arc<FeedService<PostgresPostRepository>>,
    pub(crate) engagement_service: Arc<EngagementService<PostgresEngagementRepository>>,
    pub(crate) user_service: Arc<UserService<PostgresUserRepository>>,
    pub(crate) users: Arc<PostgresUserRepository>,
    pub(crate) jwt: Arc<JwtService>,
}
