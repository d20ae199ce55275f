pub mod cities;
pub mod filter;
pub mod models;

pub use cities::CityUniverse;
pub use filter::Filter;
pub use models::{Comment, FacetCount, Feed, Like, Post, PostDetail, PostDraft, PostId};
