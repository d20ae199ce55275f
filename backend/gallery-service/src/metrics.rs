//! Prometheus metrics for gallery-service.
//!
//! Collectors register against the default registry and are exposed by the
//! `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Feed requests by sort mode.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gallery_feed_request_total",
        "Total feed requests segmented by sort mode",
        &["sort"]
    )
    .expect("failed to register gallery_feed_request_total");

    /// Feed assembly latency by sort mode.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "gallery_feed_request_duration_seconds",
        "Feed assembly duration segmented by sort mode",
        &["sort"]
    )
    .expect("failed to register gallery_feed_request_duration_seconds");

    /// Searches that matched nothing, by miss kind (city/tag).
    pub static ref SEARCH_MISS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gallery_search_miss_total",
        "Searches that matched no posts segmented by kind",
        &["kind"]
    )
    .expect("failed to register gallery_search_miss_total");

    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "gallery_posts_created_total",
        "Total posts created"
    )
    .expect("failed to register gallery_posts_created_total");

    /// Like toggles by action (like/unlike).
    pub static ref LIKE_TOGGLE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gallery_like_toggle_total",
        "Like toggles segmented by action",
        &["action"]
    )
    .expect("failed to register gallery_like_toggle_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
