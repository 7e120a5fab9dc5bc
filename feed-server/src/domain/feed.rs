use super::limits::PostLimits;
use super::post::{Post, PostType, PostView};
use super::user::Identity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FeedFilter {
    pub(crate) followed_only: bool,
    pub(crate) liked_only: bool,
    pub(crate) post_type: Option<PostType>,
    /// Only posts written by this user.
    pub(crate) author_id: Option<i64>,
}

impl FeedFilter {
    pub(crate) fn needs_viewer(&self) -> bool {
        self.followed_only || self.liked_only
    }
}

/// 1-based page number and a page size already clamped to the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl PageRequest {
    pub(crate) fn resolve(page: Option<u32>, page_size: Option<u32>, limits: &PostLimits) -> Self {
        let page_size = match page_size {
            None | Some(0) => limits.default_page_size,
            Some(size) => size.min(limits.max_page_size),
        };

        Self {
            page: page.unwrap_or(1).max(1),
            page_size,
        }
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }
}

/// What the store is asked for; `viewer_id` drives the filters and the
/// per-viewer flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FeedQuery {
    pub(crate) viewer_id: Option<i64>,
    pub(crate) filter: FeedFilter,
    pub(crate) page: PageRequest,
}

/// A post row together with its aggregate counts, as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeedEntry {
    pub(crate) post: Post,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) viewer_follows_author: bool,
    pub(crate) viewer_liked: bool,
}

impl FeedEntry {
    pub(crate) fn into_view(self, viewer: Option<&Identity>) -> PostView {
        let can_edit = viewer.is_some_and(|viewer| viewer.can_modify(self.post.author_id));
        let is_following_author = viewer.is_some_and(|viewer| {
            !self.post.is_authored_by(viewer.user_id) && self.viewer_follows_author
        });

        PostView {
            like_count: self.like_count,
            comment_count: self.comment_count,
            can_edit,
            is_following_author,
            liked_by_viewer: viewer.is_some() && self.viewer_liked,
            post: self.post,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeedPage {
    pub(crate) items: Vec<PostView>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

impl FeedPage {
    pub(crate) fn empty(page: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            page: page.page,
            page_size: page.page_size,
            total: 0,
        }
    }

    pub(crate) fn has_next(&self) -> bool {
        i64::from(self.page) * i64::from(self.page_size) < self.total
    }
}
