use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::domain::{Post, PostId};
use crate::error::{AppError, AppResult};
use crate::services::likes::LikeIndex;

/// Feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Newest,
    MostLiked,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::MostLiked => "most_liked",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "liked" | "most_liked" | "mostliked" => Ok(SortMode::MostLiked),
            other => Err(AppError::Validation(format!(
                "Invalid sort mode '{}'. Must be 'newest' or 'liked'",
                other
            ))),
        }
    }
}

/// Orders a candidate post set. Both modes are stable sorts, so posts that
/// tie keep their input order.
#[derive(Clone)]
pub struct FeedRanker {
    likes: LikeIndex,
}

impl FeedRanker {
    pub fn new(likes: LikeIndex) -> Self {
        Self { likes }
    }

    pub async fn rank(&self, mut posts: Vec<Post>, mode: SortMode) -> AppResult<Vec<Post>> {
        match mode {
            SortMode::Newest => {
                posts.sort_by_key(|p| Reverse(p.created_at));
            }
            SortMode::MostLiked => {
                let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
                let counts = self.likes.count_likes_batch(&ids).await?;
                posts.sort_by_key(|p| Reverse(counts.get(&p.id).copied().unwrap_or(0)));
            }
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn post(id: PostId, day: u32) -> Post {
        Post {
            id,
            author_id: "alice".into(),
            image_ref: format!("img{}.jpeg", id),
            tags: vec![],
            city: "paris".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            caption: String::new(),
            comments: vec![],
        }
    }

    async fn ranker_with_likes(likes: &[(PostId, usize)]) -> FeedRanker {
        let index = LikeIndex::new(Arc::new(MemoryStore::new()));
        for (post_id, n) in likes {
            for i in 0..*n {
                index.like(*post_id, &format!("user{}", i)).await.unwrap();
            }
        }
        FeedRanker::new(index)
    }

    fn ids(posts: &[Post]) -> Vec<PostId> {
        posts.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_rank_is_stable_in_both_modes() {
        // A(2024-01-01, 3 likes), B(2024-01-02, 3 likes), C(2024-01-01, 1 like)
        let (a, b, c) = (1, 2, 3);
        let ranker = ranker_with_likes(&[(a, 3), (b, 3), (c, 1)]).await;
        let input = vec![post(a, 1), post(b, 2), post(c, 1)];

        let newest = ranker.rank(input.clone(), SortMode::Newest).await.unwrap();
        assert_eq!(ids(&newest), vec![b, a, c]);

        let liked = ranker.rank(input, SortMode::MostLiked).await.unwrap();
        assert_eq!(ids(&liked), vec![a, b, c]);
    }

    #[tokio::test]
    async fn test_unliked_posts_sort_last() {
        let ranker = ranker_with_likes(&[(2, 1)]).await;
        let ranked = ranker
            .rank(vec![post(1, 1), post(2, 1), post(3, 1)], SortMode::MostLiked)
            .await
            .unwrap();
        assert_eq!(ids(&ranked), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_mode_parsing() {
        assert_eq!("Newest".parse::<SortMode>().unwrap(), SortMode::Newest);
        assert_eq!("Liked".parse::<SortMode>().unwrap(), SortMode::MostLiked);
        assert_eq!("most_liked".parse::<SortMode>().unwrap(), SortMode::MostLiked);
        assert!(matches!(
            "oldest".parse::<SortMode>(),
            Err(AppError::Validation(_))
        ));
    }
}
