//! Feed service
//!
//! The entry points the web layer calls. Each operation normalizes its input,
//! talks to the stores through the core components and returns typed errors;
//! flash messages and redirects are the caller's business.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::models::now;
use crate::domain::{
    CityUniverse, Comment, FacetCount, Feed, Filter, Post, PostDetail, PostDraft, PostId,
};
use crate::error::{AppError, AppResult, NotFoundKind};
use crate::metrics::{
    FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL, LIKE_TOGGLE_TOTAL, POSTS_CREATED_TOTAL,
    SEARCH_MISS_TOTAL,
};
use crate::repository::{LikeStore, PostStore, SequenceStore};
use crate::services::facets::FacetAggregator;
use crate::services::likes::LikeIndex;
use crate::services::normalize::{normalize_city, parse_tags};
use crate::services::query_parser;
use crate::services::ranking::{FeedRanker, SortMode};
use crate::services::sequence::{SequenceCounter, POSTS_SEQUENCE};

/// Number of city and tag facets shown beside the feed
pub const DEFAULT_FACET_SIZE: usize = 5;

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: String,
    pub city: String,
    pub raw_tags: String,
    pub caption: String,
    pub image_ref: String,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    likes: LikeIndex,
    sequences: SequenceCounter,
    facets: FacetAggregator,
    ranker: FeedRanker,
    facet_size: usize,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        likes: Arc<dyn LikeStore>,
        sequences: Arc<dyn SequenceStore>,
        universe: CityUniverse,
        facet_size: usize,
    ) -> Self {
        let likes = LikeIndex::new(likes);
        Self {
            facets: FacetAggregator::new(posts.clone(), universe),
            ranker: FeedRanker::new(likes.clone()),
            sequences: SequenceCounter::new(sequences),
            posts,
            likes,
            facet_size,
        }
    }

    /// Build a service whose three stores are the same backend
    pub fn with_store<S>(store: Arc<S>, universe: CityUniverse, facet_size: usize) -> Self
    where
        S: PostStore + LikeStore + SequenceStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, universe, facet_size)
    }

    pub fn facets(&self) -> &FacetAggregator {
        &self.facets
    }

    // ========== Posts ==========

    pub async fn create_post(&self, new_post: NewPost) -> AppResult<PostId> {
        let draft = build_draft(&new_post.city, &new_post.raw_tags, new_post.caption)?;

        // No id is consumed for a post that fails validation, and no post is
        // written if the sequence is unavailable.
        let id = self.sequences.next(POSTS_SEQUENCE).await?;

        let post = Post {
            id,
            author_id: new_post.author_id,
            image_ref: new_post.image_ref,
            tags: draft.tags,
            city: draft.city,
            created_at: now(),
            caption: draft.caption,
            comments: Vec::new(),
        };

        self.posts.insert_post(&post).await?;
        POSTS_CREATED_TOTAL.inc();

        info!(
            post_id = post.id,
            author_id = %post.author_id,
            city = %post.city,
            tags = post.tags.len(),
            "Post created"
        );

        Ok(post.id)
    }

    pub async fn get_post(&self, post_id: PostId, viewer: Option<&str>) -> AppResult<PostDetail> {
        let post = self.require_post(post_id).await?;
        let like_count = self.likes.count_likes(post_id).await?;
        let viewer_has_liked = match viewer {
            Some(user_id) => self.likes.has_liked(post_id, user_id).await?,
            None => false,
        };

        Ok(PostDetail {
            post,
            like_count,
            viewer_has_liked,
        })
    }

    /// Replace city, tags and caption. Only the author may edit.
    pub async fn edit_post(
        &self,
        post_id: PostId,
        editor_id: &str,
        city: &str,
        raw_tags: &str,
        caption: String,
    ) -> AppResult<()> {
        let post = self.require_post(post_id).await?;
        ensure_author(&post, editor_id, "edit")?;

        let draft = build_draft(city, raw_tags, caption)?;
        if !self.posts.update_post(post_id, &draft).await? {
            return Err(AppError::post_not_found(post_id));
        }

        info!(post_id, editor_id, "Post edited");
        Ok(())
    }

    /// Delete a post. Only the author may delete; like edges are left alone.
    pub async fn delete_post(&self, post_id: PostId, requester_id: &str) -> AppResult<bool> {
        let post = match self.posts.find_post(post_id).await? {
            Some(post) => post,
            None => return Ok(false),
        };
        ensure_author(&post, requester_id, "delete")?;

        let deleted = self.posts.delete_post(post_id).await?;
        info!(post_id, requester_id, deleted, "Post deleted");
        Ok(deleted)
    }

    /// The author's posts, newest first
    pub async fn posts_by_author(&self, author_id: &str) -> AppResult<Vec<Post>> {
        let posts = self.posts.find_posts_by_author(author_id).await?;
        self.ranker.rank(posts, SortMode::Newest).await
    }

    /// Posts the user has liked, in the order they were first liked
    pub async fn liked_posts(&self, user_id: &str) -> AppResult<Vec<Post>> {
        let ids = self.likes.liked_post_ids(user_id).await?;
        let mut posts = self.posts.find_posts_by_ids(&ids).await?;
        posts.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(posts)
    }

    /// Ordered city picker for the post form
    pub async fn city_choices(&self) -> AppResult<Vec<String>> {
        self.facets.city_choices().await
    }

    // ========== Likes ==========

    /// Set the user's like state on a post and return the resulting count.
    ///
    /// Liking twice does not add a second edge.
    pub async fn toggle_like(&self, post_id: PostId, user_id: &str, like: bool) -> AppResult<i64> {
        self.require_post(post_id).await?;

        if like {
            if self.likes.has_liked(post_id, user_id).await? {
                debug!(post_id, user_id, "Already liked");
            } else {
                self.likes.like(post_id, user_id).await?;
            }
            LIKE_TOGGLE_TOTAL.with_label_values(&["like"]).inc();
        } else {
            self.likes.unlike(post_id, user_id).await?;
            LIKE_TOGGLE_TOTAL.with_label_values(&["unlike"]).inc();
        }

        self.likes.count_likes(post_id).await
    }

    // ========== Comments ==========

    pub async fn add_comment(&self, post_id: PostId, author_id: &str, text: &str) -> AppResult<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("comment text must not be empty".into()));
        }

        let comment = Comment {
            text: text.to_string(),
            author_id: author_id.to_string(),
            created_at: now(),
        };

        if !self.posts.push_comment(post_id, &comment).await? {
            return Err(AppError::post_not_found(post_id));
        }

        debug!(post_id, author_id, "Comment added");
        Ok(comment)
    }

    /// Remove the comment matching (text, author, timestamp) exactly
    pub async fn remove_comment(
        &self,
        post_id: PostId,
        author_id: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let comment = Comment {
            text: text.to_string(),
            author_id: author_id.to_string(),
            created_at,
        };
        let removed = self.posts.pull_comment(post_id, &comment).await?;
        debug!(post_id, author_id, removed, "Comment removal");
        Ok(removed)
    }

    // ========== Feed ==========

    /// Filter, rank and summarize the post set.
    ///
    /// A search that matches nothing is an error naming whether the city or
    /// the tag was missing; an absent search returns the whole feed.
    pub async fn get_feed(&self, raw_search: Option<&str>, sort: SortMode) -> AppResult<Feed> {
        let start = Instant::now();
        let filter = query_parser::parse_optional(raw_search)?;

        let candidates = self.posts.find_posts(&filter).await?;
        if candidates.is_empty() && !filter.is_all() {
            let err = self.miss_for(&filter).await?;
            if let AppError::NotFound { kind, .. } = &err {
                let kind = kind.to_string();
                SEARCH_MISS_TOTAL.with_label_values(&[kind.as_str()]).inc();
            }
            warn!(filter = ?filter, "Search matched no posts");
            return Err(err);
        }

        let posts = self.ranker.rank(candidates, sort).await?;
        let (cities, tags) = self.facet_summary().await?;

        FEED_REQUEST_TOTAL.with_label_values(&[sort.as_str()]).inc();
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[sort.as_str()])
            .observe(start.elapsed().as_secs_f64());

        debug!(
            filter = ?filter,
            sort = %sort,
            posts = posts.len(),
            "Feed assembled"
        );

        Ok(Feed {
            filter,
            posts,
            cities,
            tags,
        })
    }

    async fn facet_summary(&self) -> AppResult<(Vec<FacetCount>, Vec<FacetCount>)> {
        tokio::try_join!(
            self.facets.top_cities(self.facet_size),
            self.facets.top_tags(self.facet_size)
        )
    }

    /// Which part of an empty search was missing
    async fn miss_for(&self, filter: &Filter) -> AppResult<AppError> {
        let err = match filter {
            Filter::All => AppError::Internal("unfiltered feed cannot miss".into()),
            Filter::City(city) => AppError::not_found(NotFoundKind::City, city.clone()),
            Filter::Tag(tag) => AppError::not_found(NotFoundKind::Tag, tag.clone()),
            Filter::AnyTag(tags) => AppError::not_found(NotFoundKind::Tag, tags.join(",")),
            Filter::CityAndAnyTag { city, tags } => {
                let city_filter = Filter::City(city.clone());
                if self.posts.find_posts(&city_filter).await?.is_empty() {
                    AppError::not_found(NotFoundKind::City, city.clone())
                } else {
                    AppError::not_found(NotFoundKind::Tag, tags.join(","))
                }
            }
        };
        Ok(err)
    }

    async fn require_post(&self, post_id: PostId) -> AppResult<Post> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))
    }
}

fn build_draft(city: &str, raw_tags: &str, caption: String) -> AppResult<PostDraft> {
    let city = normalize_city(city);
    if city.is_empty() {
        return Err(AppError::Validation("city must not be empty".into()));
    }

    Ok(PostDraft {
        city,
        tags: parse_tags(raw_tags),
        caption,
    })
}

fn ensure_author(post: &Post, user_id: &str, action: &str) -> AppResult<()> {
    if post.author_id != user_id {
        return Err(AppError::Forbidden(format!(
            "only the author may {} post {}",
            action, post.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn service() -> FeedService {
        FeedService::with_store(
            Arc::new(MemoryStore::new()),
            CityUniverse::known(),
            DEFAULT_FACET_SIZE,
        )
    }

    fn new_post(author: &str, city: &str, tags: &str) -> NewPost {
        NewPost {
            author_id: author.into(),
            city: city.into(),
            raw_tags: tags.into(),
            caption: "caption".into(),
            image_ref: "uploads/img.jpeg".into(),
        }
    }

    #[tokio::test]
    async fn test_create_post_normalizes_input() {
        let svc = service();
        let id = svc
            .create_post(new_post("alice", "  PARIS ", "#City #red city #CITY #"))
            .await
            .unwrap();

        let detail = svc.get_post(id, None).await.unwrap();
        assert_eq!(detail.post.city, "paris");
        assert_eq!(detail.post.tags, vec!["city", "red"]);
        assert_eq!(detail.like_count, 0);
    }

    #[tokio::test]
    async fn test_empty_city_is_rejected_without_consuming_an_id() {
        let svc = service();
        let err = svc.create_post(new_post("alice", "   ", "#red")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let id = svc.create_post(new_post("alice", "rome", "")).await.unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_toggle_like_is_idempotent() {
        let svc = service();
        let id = svc.create_post(new_post("alice", "paris", "")).await.unwrap();

        assert_eq!(svc.toggle_like(id, "bob", true).await.unwrap(), 1);
        assert_eq!(svc.toggle_like(id, "bob", true).await.unwrap(), 1);
        assert_eq!(svc.toggle_like(id, "carol", true).await.unwrap(), 2);
        assert_eq!(svc.toggle_like(id, "bob", false).await.unwrap(), 1);
        assert_eq!(svc.toggle_like(id, "bob", false).await.unwrap(), 1);

        let detail = svc.get_post(id, Some("carol")).await.unwrap();
        assert!(detail.viewer_has_liked);
    }

    #[tokio::test]
    async fn test_toggle_like_on_missing_post() {
        let svc = service();
        let err = svc.toggle_like(42, "bob", true).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                kind: NotFoundKind::Post,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_only_author_can_edit_or_delete() {
        let svc = service();
        let id = svc.create_post(new_post("alice", "paris", "#red")).await.unwrap();

        let err = svc
            .edit_post(id, "mallory", "rome", "#blue", "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(matches!(
            svc.delete_post(id, "mallory").await,
            Err(AppError::Forbidden(_))
        ));

        svc.edit_post(id, "alice", "Rome", "#Blue #blue", "new".into())
            .await
            .unwrap();
        let post = svc.get_post(id, None).await.unwrap().post;
        assert_eq!(post.city, "rome");
        assert_eq!(post.tags, vec!["blue"]);
        assert_eq!(post.caption, "new");

        assert!(svc.delete_post(id, "alice").await.unwrap());
        assert!(!svc.delete_post(id, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_comments_add_and_remove_by_exact_match() {
        let svc = service();
        let id = svc.create_post(new_post("alice", "paris", "")).await.unwrap();

        let comment = svc.add_comment(id, "bob", " I love this city!! ").await.unwrap();
        assert_eq!(comment.text, "I love this city!!");

        assert!(!svc
            .remove_comment(id, "carol", &comment.text, comment.created_at)
            .await
            .unwrap());
        assert!(svc
            .remove_comment(id, "bob", &comment.text, comment.created_at)
            .await
            .unwrap());
        assert!(svc.get_post(id, None).await.unwrap().post.comments.is_empty());

        assert!(matches!(
            svc.add_comment(id, "bob", "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.add_comment(999, "bob", "hi").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_city_choices_rank_used_then_pad_with_universe() {
        let svc = service();
        for city in ["paris", "Paris", "boston", "zurich"] {
            svc.create_post(new_post("alice", city, "")).await.unwrap();
        }

        let choices = svc.city_choices().await.unwrap();
        assert_eq!(
            choices[..5],
            ["Paris", "Boston", "Zurich", "Wellesley", "Tokyo"]
        );

        let universe = CityUniverse::known();
        assert_eq!(choices.len(), universe.len() + 1);
        let distinct: std::collections::HashSet<&String> = choices.iter().collect();
        assert_eq!(distinct.len(), choices.len());
        assert!(choices.contains(&"New York City".to_string()));
    }

    #[tokio::test]
    async fn test_posts_by_author_newest_first() {
        let svc = service();
        let mut mine = Vec::new();
        for city in ["paris", "rome", "tokyo"] {
            mine.push(svc.create_post(new_post("alice", city, "")).await.unwrap());
            svc.create_post(new_post("bob", city, "")).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let posts = svc.posts_by_author("alice").await.unwrap();
        assert!(posts.iter().all(|p| p.author_id == "alice"));
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        mine.reverse();
        assert_eq!(ids, mine);

        assert!(svc.posts_by_author("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_liked_posts_in_like_order() {
        let svc = service();
        let first = svc.create_post(new_post("alice", "paris", "")).await.unwrap();
        let second = svc.create_post(new_post("alice", "rome", "")).await.unwrap();

        svc.toggle_like(second, "bob", true).await.unwrap();
        svc.toggle_like(first, "bob", true).await.unwrap();

        let liked: Vec<PostId> = svc
            .liked_posts("bob")
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(liked, vec![second, first]);
    }
}
