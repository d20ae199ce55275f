//! City and tag facet summaries.
//!
//! Recomputed from the live post set on every call; nothing is cached
//! between requests.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{CityUniverse, FacetCount};
use crate::error::AppResult;
use crate::repository::PostStore;
use crate::services::normalize::display_city;

#[derive(Clone)]
pub struct FacetAggregator {
    posts: Arc<dyn PostStore>,
    universe: CityUniverse,
}

impl FacetAggregator {
    pub fn new(posts: Arc<dyn PostStore>, universe: CityUniverse) -> Self {
        Self { posts, universe }
    }

    /// Most used cities, padded with unused known cities up to `n`.
    pub async fn top_cities(&self, n: usize) -> AppResult<Vec<FacetCount>> {
        let counts = self.posts.city_counts().await?;
        let ranked = rank_cities(counts, &self.universe);
        let facets = pad_with_universe(ranked, &self.universe, Some(n));
        debug!(requested = n, returned = facets.len(), "Computed city facets");
        Ok(facets)
    }

    /// Most used tags; only tags that appear on at least one post.
    pub async fn top_tags(&self, n: usize) -> AppResult<Vec<FacetCount>> {
        let counts = self.posts.tag_counts().await?;
        let mut ranked = rank_tags(counts);
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Every selectable city: used ones by popularity, then the rest of the
    /// universe in its own order.
    pub async fn city_choices(&self) -> AppResult<Vec<String>> {
        let counts = self.posts.city_counts().await?;
        let ranked = rank_cities(counts, &self.universe);
        Ok(pad_with_universe(ranked, &self.universe, None)
            .into_iter()
            .map(|facet| facet.name)
            .collect())
    }
}

/// Sort by count desc; ties by universe position, then unknown cities lexicographically.
fn rank_cities(mut counts: Vec<(String, i64)>, universe: &CityUniverse) -> Vec<(String, i64)> {
    counts.retain(|(_, count)| *count > 0);
    counts.sort_by(|(a, a_count), (b, b_count)| {
        b_count.cmp(a_count).then_with(|| {
            match (universe.position(a), universe.position(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        })
    });
    counts
}

fn rank_tags(counts: Vec<(String, i64)>) -> Vec<FacetCount> {
    let mut counts: Vec<(String, i64)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
    counts.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
    counts
        .into_iter()
        .map(|(tag, count)| FacetCount::new(tag, count))
        .collect()
}

/// Display-capitalize ranked cities and append zero-count universe cities.
fn pad_with_universe(
    ranked: Vec<(String, i64)>,
    universe: &CityUniverse,
    limit: Option<usize>,
) -> Vec<FacetCount> {
    let limit = limit.unwrap_or(usize::MAX);
    let used: HashSet<String> = ranked.iter().map(|(city, _)| city.clone()).collect();

    let mut facets: Vec<FacetCount> = ranked
        .into_iter()
        .take(limit)
        .map(|(city, count)| FacetCount::new(display_city(&city), count))
        .collect();

    for city in universe.iter() {
        if facets.len() >= limit {
            break;
        }
        if !used.contains(city) {
            facets.push(FacetCount::new(display_city(city), 0));
        }
    }

    facets
}
