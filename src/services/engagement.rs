// The like/unlike state machine and its derived notifications.
// Per (user, post) pair the states are NotLiked and Liked; the store's
// UNIQUE constraint arbitrates concurrent identical transitions.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    id_generator::IdGenerator,
    models::{Like, Notification, NotificationVerb},
    store::SocialStore,
};

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn SocialStore>,
    id_generator: Arc<IdGenerator>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn SocialStore>, id_generator: Arc<IdGenerator>) -> Self {
        Self {
            store,
            id_generator,
        }
    }

    /// NotLiked -> Liked. Creates the like row and, unless the actor likes
    /// their own post, exactly one notification for the post's author - both
    /// in one unit of work. A duplicate attempt creates nothing and surfaces
    /// as AlreadyLiked.
    pub async fn like(&self, actor_id: i64, post_id: i64) -> AppResult<Like> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", post_id)))?;

        let now = Utc::now().timestamp();
        let like = Like {
            id: self.id_generator.next_id(),
            user_id: actor_id,
            post_id,
            created_at: now,
        };

        // No notification for self-likes
        let notification = if post.author_id != actor_id {
            Some(Notification {
                id: self.id_generator.next_id(),
                recipient_id: post.author_id,
                actor_id,
                verb: NotificationVerb::LikedPost.as_str().to_string(),
                target_id: post_id,
                created_at: now,
            })
        } else {
            None
        };

        let created = self
            .store
            .create_like(&like, notification.as_ref())
            .await?;

        if !created {
            return Err(AppError::AlreadyLiked(format!(
                "post {} is already liked",
                post_id
            )));
        }

        tracing::info!("User {} liked post {}", actor_id, post_id);

        Ok(like)
    }

    /// Liked -> NotLiked. Deletes the like row; the notification written on
    /// the way in is history and stays. Unliking a post the actor never
    /// liked is a NotFound-class failure the client can correct.
    pub async fn unlike(&self, actor_id: i64, post_id: i64) -> AppResult<()> {
        let removed = self.store.remove_like(actor_id, post_id).await?;

        if !removed {
            return Err(AppError::NotFound(
                "you have not liked this post".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn like_count(&self, post_id: i64) -> AppResult<i64> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Post with id {} not found",
                post_id
            )));
        }

        Ok(self.store.like_count(post_id).await?)
    }

    pub async fn notifications(&self, recipient_id: i64) -> AppResult<Vec<Notification>> {
        Ok(self.store.notifications_for(recipient_id).await?)
    }
}
