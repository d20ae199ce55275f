use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::AppResult;
use crate::services::{FeedService, SortMode};

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl FeedQueryParams {
    /// Absent sort means most liked first, the home page default
    pub(crate) fn sort_mode(&self) -> AppResult<SortMode> {
        match self.sort.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse(),
            _ => Ok(SortMode::MostLiked),
        }
    }
}

pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    service: web::Data<FeedService>,
) -> AppResult<HttpResponse> {
    let sort = query.sort_mode()?;
    debug!(search = ?query.search, sort = %sort, "Feed request");

    let feed = service.get_feed(query.search.as_deref(), sort).await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// Ordered city picker for the post form
pub async fn get_city_choices(service: web::Data<FeedService>) -> AppResult<HttpResponse> {
    let cities = service.city_choices().await?;
    Ok(HttpResponse::Ok().json(cities))
}
