use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::{Comment, Filter, Post, PostDraft, PostId};
use crate::error::AppResult;
use crate::repository::{LikeStore, PostStore, SequenceStore};

const POST_COLUMNS: &str = r#"
    SELECT post_id, author_id, image_ref, tags, city, caption, created_at
    FROM posts
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    post_id: i64,
    author_id: String,
    image_ref: String,
    tags: Vec<String>,
    city: String,
    caption: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    post_id: i64,
    text: String,
    author_id: String,
    created_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, comments: Vec<Comment>) -> Post {
        Post {
            id: self.post_id,
            author_id: self.author_id,
            image_ref: self.image_ref,
            tags: self.tags,
            city: self.city,
            created_at: self.created_at,
            caption: self.caption,
            comments,
        }
    }
}

/// PostgreSQL-backed store for posts, likes and sequences
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load comments for the rows and assemble full posts
    async fn hydrate(&self, rows: Vec<PostRow>) -> AppResult<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.post_id).collect();
        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT post_id, text, author_id, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY post_id, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut comments: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments.entry(row.post_id).or_default().push(Comment {
                text: row.text,
                author_id: row.author_id,
                created_at: row.created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_comments = comments.remove(&row.post_id).unwrap_or_default();
                row.into_post(post_comments)
            })
            .collect())
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &Post) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (post_id, author_id, image_ref, tags, city, caption, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id)
        .bind(&post.author_id)
        .bind(&post.image_ref)
        .bind(&post.tags)
        .bind(&post.city)
        .bind(&post.caption)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_post(&self, post_id: PostId) -> AppResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{} WHERE post_id = $1", POST_COLUMNS))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_posts(&self, filter: &Filter) -> AppResult<Vec<Post>> {
        let rows = match filter {
            Filter::All => {
                sqlx::query_as::<_, PostRow>(&format!("{} ORDER BY post_id", POST_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::City(city) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE city = $1 ORDER BY post_id",
                    POST_COLUMNS
                ))
                .bind(city)
                .fetch_all(&self.pool)
                .await?
            }
            Filter::Tag(tag) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE $1 = ANY(tags) ORDER BY post_id",
                    POST_COLUMNS
                ))
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
            Filter::AnyTag(tags) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE tags && $1 ORDER BY post_id",
                    POST_COLUMNS
                ))
                .bind(tags)
                .fetch_all(&self.pool)
                .await?
            }
            Filter::CityAndAnyTag { city, tags } => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE city = $1 AND tags && $2 ORDER BY post_id",
                    POST_COLUMNS
                ))
                .bind(city)
                .bind(tags)
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate(rows).await
    }

    async fn find_posts_by_ids(&self, post_ids: &[PostId]) -> AppResult<Vec<Post>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{} WHERE post_id = ANY($1) ORDER BY post_id",
            POST_COLUMNS
        ))
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn find_posts_by_author(&self, author_id: &str) -> AppResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{} WHERE author_id = $1 ORDER BY post_id",
            POST_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET city = $2, tags = $3, caption = $4
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .bind(&draft.city)
        .bind(&draft.tags)
        .bind(&draft.caption)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, post_id: PostId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, text, author_id, created_at)
            SELECT $1::BIGINT, $2::TEXT, $3::TEXT, $4::TIMESTAMPTZ
            WHERE EXISTS (SELECT 1 FROM posts WHERE post_id = $1)
            "#,
        )
        .bind(post_id)
        .bind(&comment.text)
        .bind(&comment.author_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_comment(&self, post_id: PostId, comment: &Comment) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE post_id = $1 AND text = $2 AND author_id = $3 AND created_at = $4
            "#,
        )
        .bind(post_id)
        .bind(&comment.text)
        .bind(&comment.author_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn city_counts(&self) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT city, COUNT(*) AS count FROM posts GROUP BY city",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn tag_counts(&self) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM posts, UNNEST(tags) AS tag
            GROUP BY tag
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl LikeStore for PgStore {
    async fn insert_like(&self, post_id: PostId, user_id: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2)")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_likes(&self, post_id: PostId, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn has_liked(&self, post_id: PostId, user_id: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE post_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_likes(&self, post_id: PostId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_likes_batch(&self, post_ids: &[PostId]) -> AppResult<HashMap<PostId, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT post_id, COUNT(*) AS count
            FROM likes
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn liked_post_ids(&self, user_id: &str) -> AppResult<Vec<PostId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT post_id
            FROM likes
            WHERE user_id = $1
            GROUP BY post_id
            ORDER BY MIN(id)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

#[async_trait]
impl SequenceStore for PgStore {
    async fn increment(&self, name: &str) -> AppResult<i64> {
        // Single-statement upsert: the row lock serializes concurrent callers.
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequences (name, value)
            VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE
            SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }
}
