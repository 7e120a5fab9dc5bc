use std::sync::Arc;

use tracing::error;

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedEntry, FeedFilter, FeedPage, FeedQuery, PageRequest};
use crate::domain::limits::PostLimits;
use crate::domain::user::Identity;

/// Builds one page of the feed for a (possibly anonymous) viewer.
pub(crate) struct FeedService<R: PostRepository> {
    repo: R,
    limits: Arc<PostLimits>,
}

impl<R: PostRepository> FeedService<R> {
    pub(crate) fn new(repo: R, limits: Arc<PostLimits>) -> Self {
        Self { repo, limits }
    }

    pub(crate) async fn query_feed(
        &self,
        viewer: Option<&Identity>,
        filter: FeedFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<FeedPage, DomainError> {
        let page = PageRequest::resolve(page, page_size, &self.limits);

        // Nothing is followed or liked by nobody.
        if filter.needs_viewer() && viewer.is_none() {
            return Ok(FeedPage::empty(page));
        }

        let query = FeedQuery {
            viewer_id: viewer.map(|viewer| viewer.user_id),
            filter,
            page,
        };

        let (entries, total) = match self.fetch(&query).await {
            Ok(found) => found,
            Err(err) => {
                error!(
                    viewer_id = ?query.viewer_id,
                    followed_only = filter.followed_only,
                    liked_only = filter.liked_only,
                    post_type = ?filter.post_type,
                    author_id = ?filter.author_id,
                    page = page.page,
                    page_size = page.page_size,
                    error = %err,
                    "feed query failed"
                );
                return Err(err);
            }
        };

        Ok(FeedPage {
            items: entries
                .into_iter()
                .map(|entry| entry.into_view(viewer))
                .collect(),
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }

    async fn fetch(&self, query: &FeedQuery) -> Result<(Vec<FeedEntry>, i64), DomainError> {
        let entries = self.repo.query_feed(query).await?;
        let total = self.repo.count_feed(query).await?;
        Ok((entries, total))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FeedService;
    use crate::data::engagement_repository::EngagementRepository;
    use crate::data::post_repository::{NewPost, PostRepository};
    use crate::data::repositories::memory::MemoryStore;
    use crate::domain::error::DomainError;
    use crate::domain::feed::FeedFilter;
    use crate::domain::limits::PostLimits;
    use crate::domain::post::{FileAttributes, Post, PostMetadata, PostType};
    use crate::domain::user::{Identity, Role};

    fn user(id: i64, name: &str) -> Identity {
        Identity::new(id, name, Role::Member).expect("identity must be valid")
    }

    fn admin(id: i64) -> Identity {
        Identity::new(id, "admin", Role::Admin).expect("identity must be valid")
    }

    async fn seed_post(repo: &MemoryStore, author: &Identity, post_type: PostType) -> Post {
        let metadata = match post_type {
            PostType::Text => PostMetadata::Text {
                extra: Default::default(),
            },
            PostType::Image => PostMetadata::Image {
                file: file("png"),
                extra: Default::default(),
            },
            PostType::Video => PostMetadata::Video {
                file: file("mp4"),
                duration: None,
                extra: Default::default(),
            },
        };
        repo.create_post(NewPost {
            title: format!("{post_type} by {}", author.username),
            content: "body".to_string(),
            author_id: author.user_id,
            post_type,
            media_key: post_type.requires_media().then(|| "key.bin".to_string()),
            metadata,
        })
        .await
        .expect("seed post must be created")
    }

    fn file(file_type: &str) -> FileAttributes {
        FileAttributes {
            file_size: 1,
            file_type: file_type.to_string(),
            content_type: None,
        }
    }

    fn setup() -> (FeedService<MemoryStore>, MemoryStore, Identity, Identity, Identity) {
        let repo = MemoryStore::new();
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let carol = user(3, "carol");
        for identity in [&alice, &bob, &carol] {
            repo.add_user(identity);
        }
        let service = FeedService::new(repo.clone(), Arc::new(PostLimits::default()));
        (service, repo, alice, bob, carol)
    }

    fn followed_only() -> FeedFilter {
        FeedFilter {
            followed_only: true,
            ..FeedFilter::default()
        }
    }

    #[tokio::test]
    async fn feed_is_newest_first_for_anonymous_viewer() {
        let (service, repo, alice, bob, _) = setup();
        let first = seed_post(&repo, &alice, PostType::Text).await;
        let second = seed_post(&repo, &bob, PostType::Image).await;

        let page = service
            .query_feed(None, FeedFilter::default(), None, None)
            .await
            .expect("feed must load");

        let ids: Vec<i64> = page.items.iter().map(|item| item.post.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        assert!(page.items.iter().all(|item| !item.can_edit));
        assert!(page.items.iter().all(|item| !item.is_following_author));
    }

    #[tokio::test]
    async fn followed_only_with_no_follows_is_empty() {
        let (service, repo, alice, bob, _) = setup();
        seed_post(&repo, &bob, PostType::Text).await;

        let page = service
            .query_feed(Some(&alice), followed_only(), None, None)
            .await
            .expect("feed must load");

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn followed_only_without_viewer_is_empty() {
        let (service, repo, _, bob, _) = setup();
        seed_post(&repo, &bob, PostType::Text).await;
        repo.fail_storage(true);

        let page = service
            .query_feed(None, followed_only(), Some(2), Some(5))
            .await
            .expect("anonymous filter must not hit storage");

        assert!(page.items.is_empty());
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 5);
    }

    #[tokio::test]
    async fn followed_only_and_video_intersect() {
        let (service, repo, alice, bob, carol) = setup();
        let bob_video = seed_post(&repo, &bob, PostType::Video).await;
        seed_post(&repo, &bob, PostType::Image).await;
        seed_post(&repo, &carol, PostType::Video).await;
        repo.insert_follow(alice.user_id, bob.user_id)
            .await
            .expect("follow must be stored");

        let filter = FeedFilter {
            followed_only: true,
            post_type: Some(PostType::Video),
            ..FeedFilter::default()
        };
        let page = service
            .query_feed(Some(&alice), filter, None, None)
            .await
            .expect("feed must load");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].post.id, bob_video.id);
        assert!(page.items[0].is_following_author);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn liked_only_and_followed_only_compose_with_and() {
        let (service, repo, alice, bob, carol) = setup();
        let liked_followed = seed_post(&repo, &bob, PostType::Text).await;
        let unliked_followed = seed_post(&repo, &bob, PostType::Text).await;
        let liked_unfollowed = seed_post(&repo, &carol, PostType::Text).await;
        repo.insert_follow(alice.user_id, bob.user_id)
            .await
            .expect("follow must be stored");
        for post in [&liked_followed, &liked_unfollowed] {
            repo.insert_like(alice.user_id, post.id)
                .await
                .expect("like must be stored");
        }

        let liked = FeedFilter {
            liked_only: true,
            ..FeedFilter::default()
        };
        let page = service
            .query_feed(Some(&alice), liked, None, None)
            .await
            .expect("feed must load");
        let ids: Vec<i64> = page.items.iter().map(|item| item.post.id).collect();
        assert_eq!(ids, vec![liked_unfollowed.id, liked_followed.id]);
        assert!(page.items.iter().all(|item| item.liked_by_viewer));

        let both = FeedFilter {
            followed_only: true,
            liked_only: true,
            ..FeedFilter::default()
        };
        let page = service
            .query_feed(Some(&alice), both, None, None)
            .await
            .expect("feed must load");
        let ids: Vec<i64> = page.items.iter().map(|item| item.post.id).collect();
        assert_eq!(ids, vec![liked_followed.id]);
        assert!(!ids.contains(&unliked_followed.id));
    }

    #[tokio::test]
    async fn author_filter_keeps_one_users_posts() {
        let (service, repo, alice, bob, _) = setup();
        let bob_text = seed_post(&repo, &bob, PostType::Text).await;
        seed_post(&repo, &alice, PostType::Text).await;
        let bob_image = seed_post(&repo, &bob, PostType::Image).await;

        let filter = FeedFilter {
            author_id: Some(bob.user_id),
            ..FeedFilter::default()
        };
        let page = service
            .query_feed(None, filter, None, None)
            .await
            .expect("feed must load");

        let ids: Vec<i64> = page.items.iter().map(|item| item.post.id).collect();
        assert_eq!(ids, vec![bob_image.id, bob_text.id]);
        assert_eq!(page.total, 2);

        let images = FeedFilter {
            author_id: Some(bob.user_id),
            post_type: Some(PostType::Image),
            ..FeedFilter::default()
        };
        let page = service
            .query_feed(Some(&alice), images, None, None)
            .await
            .expect("feed must load");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].post.id, bob_image.id);
    }

    #[tokio::test]
    async fn oversized_page_is_clamped() {
        let (service, repo, alice, _, _) = setup();
        for _ in 0..120 {
            seed_post(&repo, &alice, PostType::Text).await;
        }

        let page = service
            .query_feed(None, FeedFilter::default(), None, Some(1000))
            .await
            .expect("feed must load");

        assert_eq!(page.items.len(), 100);
        assert_eq!(page.page_size, 100);
        assert_eq!(page.total, 120);
        assert!(page.has_next());

        let last = service
            .query_feed(None, FeedFilter::default(), Some(2), Some(1000))
            .await
            .expect("feed must load");
        assert_eq!(last.items.len(), 20);
        assert!(!last.has_next());
    }

    #[tokio::test]
    async fn derived_fields_follow_the_viewer() {
        let (service, repo, alice, bob, _) = setup();
        let own = seed_post(&repo, &alice, PostType::Text).await;
        let bobs = seed_post(&repo, &bob, PostType::Text).await;
        repo.insert_follow(alice.user_id, bob.user_id)
            .await
            .expect("follow must be stored");
        repo.insert_like(bob.user_id, own.id)
            .await
            .expect("like must be stored");

        let page = service
            .query_feed(Some(&alice), FeedFilter::default(), None, None)
            .await
            .expect("feed must load");
        let own_view = page
            .items
            .iter()
            .find(|item| item.post.id == own.id)
            .expect("own post must be listed");
        let bobs_view = page
            .items
            .iter()
            .find(|item| item.post.id == bobs.id)
            .expect("bob's post must be listed");

        assert!(own_view.can_edit);
        assert!(!own_view.is_following_author);
        assert_eq!(own_view.like_count, 1);
        assert!(!own_view.liked_by_viewer);
        assert!(!bobs_view.can_edit);
        assert!(bobs_view.is_following_author);

        let admin = admin(9);
        repo.add_user(&admin);
        let page = service
            .query_feed(Some(&admin), FeedFilter::default(), None, None)
            .await
            .expect("feed must load");
        assert!(page.items.iter().all(|item| item.can_edit));
    }

    #[tokio::test]
    async fn storage_errors_are_propagated_unchanged() {
        let (service, repo, alice, _, _) = setup();
        repo.fail_storage(true);

        let err = service
            .query_feed(Some(&alice), FeedFilter::default(), None, None)
            .await
            .expect_err("storage must fail");

        assert!(matches!(err, DomainError::Storage(_)));
    }
}
