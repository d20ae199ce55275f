use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::filter::Filter;

/// Post identifier issued by the "posts" sequence
pub type PostId = i64;

/// Post entity - an image tagged with a city and free-form labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: String,
    pub image_ref: String,
    /// Normalized lowercase tags, first-seen order, no duplicates
    pub tags: Vec<String>,
    /// Normalized lowercase city
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub caption: String,
    pub comments: Vec<Comment>,
}

/// Comment entity - owned by its post, appended and never edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// Like edge between a user and a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub post_id: PostId,
    pub user_id: String,
}

/// Fields written when a post is created or edited
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub city: String,
    pub tags: Vec<String>,
    pub caption: String,
}

/// One entry of a facet summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: i64,
}

impl FacetCount {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Single post view: the post plus its like state
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub like_count: i64,
    pub viewer_has_liked: bool,
}

/// A ranked feed with the facet summaries shown alongside it
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub filter: Filter,
    pub posts: Vec<Post>,
    pub cities: Vec<FacetCount>,
    pub tags: Vec<FacetCount>,
}

/// Current time at the precision the stores keep.
///
/// Comments are removed by exact timestamp match, so anything that is
/// persisted must round-trip through PostgreSQL's microsecond resolution.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
