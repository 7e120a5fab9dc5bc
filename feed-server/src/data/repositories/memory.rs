//! In-memory store used by service tests. Mirrors the constraints the
//! Postgres schema enforces: foreign keys, unique like/follow pairs and
//! cascading deletes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::data::engagement_repository::{EngagementRepository, NewComment};
use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, Follow, Like};
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedEntry, FeedQuery, PageRequest};
use crate::domain::post::Post;
use crate::domain::user::{Identity, UserProfile};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, String>,
    posts: BTreeMap<i64, Post>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
    comments: BTreeMap<i64, Comment>,
    next_post_id: i64,
    next_comment_id: i64,
    ticks: i64,
    fail_storage: bool,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        base_time() + Duration::seconds(self.ticks)
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.fail_storage {
            return Err(DomainError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn username(&self, user_id: i64) -> Result<String, DomainError> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound("user".to_string()))
    }

    fn entry(&self, post: &Post, viewer_id: Option<i64>) -> FeedEntry {
        let like_count = self.likes.iter().filter(|l| l.post_id == post.id).count() as i64;
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;
        let viewer_follows_author = viewer_id.is_some_and(|viewer| {
            self.follows
                .iter()
                .any(|f| f.follower_id == viewer && f.followed_id == post.author_id)
        });
        let viewer_liked = viewer_id.is_some_and(|viewer| {
            self.likes
                .iter()
                .any(|l| l.user_id == viewer && l.post_id == post.id)
        });

        FeedEntry {
            post: post.clone(),
            like_count,
            comment_count,
            viewer_follows_author,
            viewer_liked,
        }
    }

    fn profile(&self, user_id: i64, username: &str, viewer_id: Option<i64>) -> UserProfile {
        let follower_count = self.follows.iter().filter(|f| f.followed_id == user_id).count();
        let following_count = self.follows.iter().filter(|f| f.follower_id == user_id).count();
        let post_count = self
            .posts
            .values()
            .filter(|post| post.author_id == user_id)
            .count();
        let is_following = viewer_id.is_some_and(|viewer| {
            self.follows
                .iter()
                .any(|f| f.follower_id == viewer && f.followed_id == user_id)
        });

        UserProfile {
            id: user_id,
            username: username.to_string(),
            follower_count: follower_count as i64,
            following_count: following_count as i64,
            post_count: post_count as i64,
            is_following,
        }
    }

    fn matching_posts(&self, query: &FeedQuery) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|post| {
                !query.filter.followed_only
                    || self.follows.iter().any(|f| {
                        Some(f.follower_id) == query.viewer_id && f.followed_id == post.author_id
                    })
            })
            .filter(|post| {
                !query.filter.liked_only
                    || self
                        .likes
                        .iter()
                        .any(|l| Some(l.user_id) == query.viewer_id && l.post_id == post.id)
            })
            .filter(|post| {
                query
                    .filter
                    .post_type
                    .is_none_or(|post_type| post.post_type == post_type)
            })
            .filter(|post| {
                query
                    .filter
                    .author_id
                    .is_none_or(|author_id| post.author_id == author_id)
            })
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store mutex poisoned")
    }

    pub(crate) fn add_user(&self, identity: &Identity) {
        self.lock()
            .users
            .insert(identity.user_id, identity.username.clone());
    }

    /// Every subsequent call fails like an unreachable database would.
    pub(crate) fn fail_storage(&self, fail: bool) {
        self.lock().fail_storage = fail;
    }

    pub(crate) fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub(crate) fn stored_post(&self, id: i64) -> Option<Post> {
        self.lock().posts.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_identity(&self, identity: &Identity) -> Result<(), DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        state
            .users
            .insert(identity.user_id, identity.username.clone());
        Ok(())
    }

    async fn list_profiles(
        &self,
        viewer_id: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let state = self.lock();
        state.check_available()?;

        let mut users: Vec<(&i64, &String)> = state.users.iter().collect();
        users.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));

        Ok(users
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|(id, username)| state.profile(*id, username, viewer_id))
            .collect())
    }

    async fn count_users(&self) -> Result<i64, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state.users.len() as i64)
    }

    async fn get_profile(
        &self,
        user_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<UserProfile>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state
            .users
            .get(&user_id)
            .map(|username| state.profile(user_id, username, viewer_id)))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        let author_username = state
            .username(input.author_id)
            .map_err(|_| DomainError::NotFound("author".to_string()))?;

        state.next_post_id += 1;
        let id = state.next_post_id;
        let now = state.now();
        let post = Post {
            id,
            title: input.title,
            content: input.content,
            author_id: input.author_id,
            author_username,
            post_type: input.post_type,
            media_key: input.media_key,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state.posts.get(&id).cloned())
    }

    async fn update_post(&self, post_id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        let now = state.now();
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        post.title = patch.title;
        post.content = patch.content;
        post.media_key = patch.media_key;
        post.metadata = patch.metadata;
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.likes.retain(|like| like.post_id != id);
        state.comments.retain(|_, comment| comment.post_id != id);
        Ok(true)
    }

    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page.limit()).unwrap_or(usize::MAX);

        Ok(state
            .matching_posts(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|post| state.entry(post, query.viewer_id))
            .collect())
    }

    async fn count_feed(&self, query: &FeedQuery) -> Result<i64, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state.matching_posts(query).len() as i64)
    }

    async fn get_entry(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Option<FeedEntry>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state
            .posts
            .get(&post_id)
            .map(|post| state.entry(post, viewer_id)))
    }
}

#[async_trait]
impl EngagementRepository for MemoryStore {
    async fn insert_like(&self, user_id: i64, post_id: i64) -> Result<Like, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        if !state.posts.contains_key(&post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        if state
            .likes
            .iter()
            .any(|like| like.user_id == user_id && like.post_id == post_id)
        {
            return Err(DomainError::AlreadyExists("like".to_string()));
        }

        let username = state.username(user_id)?;
        let like = Like {
            user_id,
            username,
            post_id,
            created_at: state.now(),
        };
        state.likes.push(like.clone());
        Ok(like)
    }

    async fn delete_like(&self, user_id: i64, post_id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        let before = state.likes.len();
        state
            .likes
            .retain(|like| !(like.user_id == user_id && like.post_id == post_id));
        Ok(state.likes.len() < before)
    }

    async fn list_likes(&self, post_id: i64) -> Result<Vec<Like>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        let mut likes: Vec<Like> = state
            .likes
            .iter()
            .filter(|like| like.post_id == post_id)
            .cloned()
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(likes)
    }

    async fn insert_follow(&self, follower_id: i64, followed_id: i64) -> Result<Follow, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        state.username(follower_id)?;
        state.username(followed_id)?;
        if state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id)
        {
            return Err(DomainError::AlreadyExists("follow".to_string()));
        }

        let follow = Follow {
            follower_id,
            followed_id,
            created_at: state.now(),
        };
        state.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.followed_id == followed_id));
        Ok(state.follows.len() < before)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let state = self.lock();
        state.check_available()?;
        Ok(state.comments.get(&id).cloned())
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        if !state.posts.contains_key(&input.post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        let author_username = state.username(input.author_id)?;

        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            text: input.text,
            author_id: input.author_id,
            author_username,
            post_id: input.post_id,
            created_at: state.now(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment_text(
        &self,
        id: i64,
        text: String,
    ) -> Result<Option<Comment>, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        Ok(state.comments.get_mut(&id).map(|comment| {
            comment.text = text;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        state.check_available()?;
        Ok(state.comments.remove(&id).is_some())
    }
}
