//! Gallery Service Library
//!
//! Feed ranking and faceted search for a photo-sharing site: post ids from a
//! keyed sequence, like counts, city and tag facets, a small search language
//! and stable feed ordering. Storage sits behind traits with in-memory and
//! PostgreSQL implementations; the binary exposes the engine over HTTP.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::FeedService;
