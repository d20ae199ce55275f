use std::sync::Arc;
use tracing::{debug, error};

use crate::error::AppResult;
use crate::repository::SequenceStore;

/// Sequence used to mint post ids
pub const POSTS_SEQUENCE: &str = "posts";

/// Named, strictly increasing id generator.
///
/// Values are unique and monotonic. They are not gap-free: a value whose
/// post later fails to persist is simply never used.
#[derive(Clone)]
pub struct SequenceCounter {
    store: Arc<dyn SequenceStore>,
}

impl SequenceCounter {
    pub fn new(store: Arc<dyn SequenceStore>) -> Self {
        Self { store }
    }

    pub async fn next(&self, name: &str) -> AppResult<i64> {
        match self.store.increment(name).await {
            Ok(value) => {
                debug!(sequence = name, value, "Issued sequence value");
                Ok(value)
            }
            Err(e) => {
                error!(sequence = name, error = %e, "Failed to increment sequence");
                Err(e)
            }
        }
    }
}
