// Narrow accessor contract between the service layer and persistence.
// Services only see these calls; the SQLite implementation lives in database.rs.

use crate::models::{Comment, Like, Notification, Post, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SocialStore: Send + Sync {
    // Identity store
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn username_exists(&self, username: &str) -> Result<bool>;

    // Follow graph. add/remove report whether the edge actually changed,
    // so both operations stay idempotent at the call site.
    async fn add_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool>;
    async fn remove_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool>;
    async fn followees(&self, user_id: i64) -> Result<Vec<i64>>;
    async fn follower_count(&self, user_id: i64) -> Result<i64>;
    async fn followee_count(&self, user_id: i64) -> Result<i64>;

    // Content store
    async fn create_post(&self, post: &Post) -> Result<()>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<()>;
    async fn delete_post(&self, id: i64) -> Result<()>;
    async fn list_posts(&self, search: Option<&str>) -> Result<Vec<Post>>;
    async fn posts_by_authors(&self, author_ids: &[i64]) -> Result<Vec<Post>>;

    async fn create_comment(&self, comment: &Comment) -> Result<()>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    async fn update_comment(&self, id: i64, content: &str) -> Result<()>;
    async fn delete_comment(&self, id: i64) -> Result<()>;
    async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    // Like ledger + notification sink. The notification, when given, is
    // written in the same transaction as the like row and only if that row
    // was actually inserted; a duplicate like returns Ok(false) and writes
    // nothing (first committer wins under the UNIQUE constraint).
    async fn create_like(&self, like: &Like, notification: Option<&Notification>) -> Result<bool>;
    async fn remove_like(&self, user_id: i64, post_id: i64) -> Result<bool>;
    async fn like_count(&self, post_id: i64) -> Result<i64>;
    async fn notifications_for(&self, recipient_id: i64) -> Result<Vec<Notification>>;
}
