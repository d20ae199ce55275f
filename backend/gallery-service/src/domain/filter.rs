//! Structured search filter over posts.

use serde::Serialize;

use crate::domain::models::Post;

/// Predicate produced by the query parser and applied to the post set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Filter {
    /// No search: the whole post set
    All,
    /// `city == value`
    City(String),
    /// `value ∈ tags`
    Tag(String),
    /// tags intersect the set (OR across tags)
    AnyTag(Vec<String>),
    /// `city == city` AND tags intersect the set
    CityAndAnyTag { city: String, tags: Vec<String> },
}

impl Filter {
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            Filter::All => true,
            Filter::City(city) => post.city == *city,
            Filter::Tag(tag) => post.tags.iter().any(|t| t == tag),
            Filter::AnyTag(tags) => post.tags.iter().any(|t| tags.contains(t)),
            Filter::CityAndAnyTag { city, tags } => {
                post.city == *city && post.tags.iter().any(|t| tags.contains(t))
            }
        }
    }
}
