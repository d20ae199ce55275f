use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::PostId;
use crate::error::AppResult;
use crate::repository::LikeStore;

/// Like edges between users and posts.
///
/// `like` does not deduplicate: calling it twice for the same pair stores
/// two edges and both are counted. Callers that want toggle semantics check
/// `has_liked` first. `unlike` always removes every edge for the pair.
#[derive(Clone)]
pub struct LikeIndex {
    store: Arc<dyn LikeStore>,
}

impl LikeIndex {
    pub fn new(store: Arc<dyn LikeStore>) -> Self {
        Self { store }
    }

    pub async fn like(&self, post_id: PostId, user_id: &str) -> AppResult<()> {
        self.store.insert_like(post_id, user_id).await?;
        debug!(post_id, user_id, "Like edge inserted");
        Ok(())
    }

    /// Returns the number of edges removed
    pub async fn unlike(&self, post_id: PostId, user_id: &str) -> AppResult<u64> {
        let removed = self.store.delete_likes(post_id, user_id).await?;
        debug!(post_id, user_id, removed, "Like edges removed");
        Ok(removed)
    }

    pub async fn has_liked(&self, post_id: PostId, user_id: &str) -> AppResult<bool> {
        self.store.has_liked(post_id, user_id).await
    }

    pub async fn count_likes(&self, post_id: PostId) -> AppResult<i64> {
        self.store.count_likes(post_id).await
    }

    /// Like counts for every requested post; posts with no likes map to 0
    pub async fn count_likes_batch(&self, post_ids: &[PostId]) -> AppResult<HashMap<PostId, i64>> {
        let mut counts = self.store.count_likes_batch(post_ids).await?;
        for id in post_ids {
            counts.entry(*id).or_insert(0);
        }
        Ok(counts)
    }

    pub async fn liked_post_ids(&self, user_id: &str) -> AppResult<Vec<PostId>> {
        self.store.liked_post_ids(user_id).await
    }
}
