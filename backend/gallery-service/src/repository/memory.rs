//! In-process store used by tests and by `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::{Comment, Filter, Like, Post, PostDraft, PostId};
use crate::error::{AppError, AppResult};
use crate::repository::{LikeStore, PostStore, SequenceStore};

#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<Vec<Post>>,
    likes: RwLock<Vec<Like>>,
    sequences: DashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_id(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by_key(|p| p.id);
    posts
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &Post) -> AppResult<()> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(AppError::Conflict(format!("post {} already exists", post.id)));
        }
        posts.push(post.clone());
        Ok(())
    }

    async fn find_post(&self, post_id: PostId) -> AppResult<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn find_posts(&self, filter: &Filter) -> AppResult<Vec<Post>> {
        let posts = self.posts.read().await;
        Ok(sorted_by_id(
            posts.iter().filter(|p| filter.matches(p)).cloned().collect(),
        ))
    }

    async fn find_posts_by_ids(&self, post_ids: &[PostId]) -> AppResult<Vec<Post>> {
        let wanted: HashSet<PostId> = post_ids.iter().copied().collect();
        let posts = self.posts.read().await;
        Ok(sorted_by_id(
            posts
                .iter()
                .filter(|p| wanted.contains(&p.id))
                .cloned()
                .collect(),
        ))
    }

    async fn find_posts_by_author(&self, author_id: &str) -> AppResult<Vec<Post>> {
        let posts = self.posts.read().await;
        Ok(sorted_by_id(
            posts
                .iter()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> AppResult<bool> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                post.city = draft.city.clone();
                post.tags = draft.tags.clone();
                post.caption = draft.caption.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, post_id: PostId) -> AppResult<bool> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != post_id);
        Ok(posts.len() < before)
    }

    async fn push_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                post.comments.push(comment.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                let before = post.comments.len();
                post.comments.retain(|c| c != comment);
                Ok(post.comments.len() < before)
            }
            None => Ok(false),
        }
    }

    async fn city_counts(&self) -> AppResult<Vec<(String, i64)>> {
        let posts = self.posts.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for post in posts.iter() {
            *counts.entry(post.city.clone()).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn tag_counts(&self) -> AppResult<Vec<(String, i64)>> {
        let posts = self.posts.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for tag in posts.iter().flat_map(|p| p.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn insert_like(&self, post_id: PostId, user_id: &str) -> AppResult<()> {
        self.likes.write().await.push(Like {
            post_id,
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn delete_likes(&self, post_id: PostId, user_id: &str) -> AppResult<u64> {
        let mut likes = self.likes.write().await;
        let before = likes.len();
        likes.retain(|l| !(l.post_id == post_id && l.user_id == user_id));
        Ok((before - likes.len()) as u64)
    }

    async fn has_liked(&self, post_id: PostId, user_id: &str) -> AppResult<bool> {
        let likes = self.likes.read().await;
        Ok(likes
            .iter()
            .any(|l| l.post_id == post_id && l.user_id == user_id))
    }

    async fn count_likes(&self, post_id: PostId) -> AppResult<i64> {
        let likes = self.likes.read().await;
        Ok(likes.iter().filter(|l| l.post_id == post_id).count() as i64)
    }

    async fn count_likes_batch(&self, post_ids: &[PostId]) -> AppResult<HashMap<PostId, i64>> {
        let wanted: HashSet<PostId> = post_ids.iter().copied().collect();
        let likes = self.likes.read().await;
        let mut counts = HashMap::new();
        for like in likes.iter().filter(|l| wanted.contains(&l.post_id)) {
            *counts.entry(like.post_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn liked_post_ids(&self, user_id: &str) -> AppResult<Vec<PostId>> {
        let likes = self.likes.read().await;
        let mut seen = HashSet::new();
        Ok(likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.post_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn increment(&self, name: &str) -> AppResult<i64> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.sequences.entry(name.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}
