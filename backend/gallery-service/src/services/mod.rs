/// Business logic layer for gallery-service
///
/// Leaves first: normalization, sequences and likes feed the facet
/// aggregator, query parser and ranker, which `FeedService` composes.
pub mod facets;
pub mod feed;
pub mod likes;
pub mod normalize;
pub mod query_parser;
pub mod ranking;
pub mod sequence;

pub use facets::FacetAggregator;
pub use feed::{FeedService, NewPost, DEFAULT_FACET_SIZE};
pub use likes::LikeIndex;
pub use ranking::{FeedRanker, SortMode};
pub use sequence::{SequenceCounter, POSTS_SEQUENCE};
