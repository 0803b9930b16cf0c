// Feed assembly: a graph read (the viewer's followees) feeding a filtered,
// ordered content query. Read-only, no pagination at this layer.

use std::sync::Arc;

use crate::{error::AppResult, models::Post, store::SocialStore};

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn SocialStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Posts authored by anyone the viewer follows, newest first.
    /// Ties on created_at resolve by descending id, so the order is
    /// deterministic for posts landing in the same second.
    pub async fn feed(&self, viewer_id: i64) -> AppResult<Vec<Post>> {
        let followees = self.store.followees(viewer_id).await?;

        if followees.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.store.posts_by_authors(&followees).await?)
    }
}
