pub(crate) mod comment;
pub(crate) mod error;
pub(crate) mod feed;
pub(crate) mod limits;
pub(crate) mod post;
pub(crate) mod user;
pub(crate) mod validation;
