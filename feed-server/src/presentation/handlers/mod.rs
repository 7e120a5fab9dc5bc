pub(crate) mod engagement;
pub(crate) mod feed;
pub(crate) mod form;
pub(crate) mod health;
pub(crate) mod posts;
pub(crate) mod users;
