//! Storage seams for the feed engine.
//!
//! The core never owns data. It reads and writes through these traits, which
//! are implemented by an in-memory store and a PostgreSQL store.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::{Comment, Filter, Post, PostDraft, PostId};
use crate::error::AppResult;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Document-style post storage
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &Post) -> AppResult<()>;

    async fn find_post(&self, post_id: PostId) -> AppResult<Option<Post>>;

    /// Posts matching the filter, in creation (id) order
    async fn find_posts(&self, filter: &Filter) -> AppResult<Vec<Post>>;

    /// Posts with the given ids, in id order; unknown ids are skipped
    async fn find_posts_by_ids(&self, post_ids: &[PostId]) -> AppResult<Vec<Post>>;

    async fn find_posts_by_author(&self, author_id: &str) -> AppResult<Vec<Post>>;

    /// Returns false if the post does not exist
    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> AppResult<bool>;

    async fn delete_post(&self, post_id: PostId) -> AppResult<bool>;

    /// Append a comment; returns false if the post does not exist
    async fn push_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool>;

    /// Remove every comment exactly equal to `comment`; returns true if any was removed
    async fn pull_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool>;

    /// Post count per normalized city, unordered
    async fn city_counts(&self) -> AppResult<Vec<(String, i64)>>;

    /// Post count per tag, unordered
    async fn tag_counts(&self) -> AppResult<Vec<(String, i64)>>;
}

/// Like edge storage; no uniqueness constraint on (post_id, user_id)
#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn insert_like(&self, post_id: PostId, user_id: &str) -> AppResult<()>;

    /// Delete all edges for the pair; returns how many were removed
    async fn delete_likes(&self, post_id: PostId, user_id: &str) -> AppResult<u64>;

    async fn has_liked(&self, post_id: PostId, user_id: &str) -> AppResult<bool>;

    async fn count_likes(&self, post_id: PostId) -> AppResult<i64>;

    /// Edge counts for many posts at once; posts without edges may be absent
    async fn count_likes_batch(&self, post_ids: &[PostId]) -> AppResult<HashMap<PostId, i64>>;

    /// Ids of posts the user liked, oldest like first, each id once
    async fn liked_post_ids(&self, user_id: &str) -> AppResult<Vec<PostId>>;
}

/// Keyed counters with an atomic find-and-increment
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Increment `name` and return the new value; absent counters start at 1
    async fn increment(&self, name: &str) -> AppResult<i64>;
}
