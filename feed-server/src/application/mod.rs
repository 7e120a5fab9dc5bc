pub(crate) mod engagement_service;
pub(crate) mod feed_service;
pub(crate) mod post_factory;
pub(crate) mod post_service;
pub(crate) mod user_service;
