pub(crate) mod engagement_repository;
pub(crate) mod errors;
pub(crate) mod post_repository;
pub(crate) mod user_repository;
