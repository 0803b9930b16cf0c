// Posts and comments. Authorship is stamped server-side from the viewer;
// the dispatch layer consults `is_author` before any mutation reaches here.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    id_generator::IdGenerator,
    models::{Comment, Post},
    store::SocialStore,
};

/// Authorization predicate for the dispatch layer: only the author of a
/// piece of content may edit or delete it. Everyone else gets a read-only
/// view.
pub fn is_author(viewer_id: i64, author_id: i64) -> bool {
    viewer_id == author_id
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn SocialStore>,
    id_generator: Arc<IdGenerator>,
}

impl ContentService {
    pub fn new(store: Arc<dyn SocialStore>, id_generator: Arc<IdGenerator>) -> Self {
        Self {
            store,
            id_generator,
        }
    }

    pub async fn create_post(&self, author_id: i64, title: &str, content: &str) -> AppResult<Post> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }

        let post = Post {
            id: self.id_generator.next_id(),
            author_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now().timestamp(),
        };

        self.store.create_post(&post).await?;

        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> AppResult<Post> {
        self.store
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    /// Reverse-chronological listing, optionally filtered by a
    /// case-insensitive substring match over title and content.
    pub async fn list_posts(&self, search: Option<&str>) -> AppResult<Vec<Post>> {
        Ok(self.store.list_posts(search).await?)
    }

    pub async fn update_post(&self, id: i64, title: &str, content: &str) -> AppResult<Post> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }

        // Author immutability: only title and content are writable
        self.store.update_post(id, title, content).await?;
        self.get_post(id).await
    }

    pub async fn delete_post(&self, id: i64) -> AppResult<()> {
        self.store.delete_post(id).await?;
        Ok(())
    }

    pub async fn create_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: &str,
    ) -> AppResult<Comment> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Post with id {} not found",
                post_id
            )));
        }

        let comment = Comment {
            id: self.id_generator.next_id(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now().timestamp(),
        };

        self.store.create_comment(&comment).await?;

        Ok(comment)
    }

    pub async fn get_comment(&self, id: i64) -> AppResult<Comment> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))
    }

    pub async fn comments_for_post(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Post with id {} not found",
                post_id
            )));
        }

        Ok(self.store.comments_for_post(post_id).await?)
    }

    pub async fn update_comment(&self, id: i64, content: &str) -> AppResult<Comment> {
        self.store.update_comment(id, content).await?;
        self.get_comment(id).await
    }

    pub async fn delete_comment(&self, id: i64) -> AppResult<()> {
        self.store.delete_comment(id).await?;
        Ok(())
    }
}
