use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::Cache;
use crate::models::{Comment, Like, Notification, Post, User};
use crate::store::SocialStore;

// Async SQLite store with a connection pool and per-concern LRU caches
pub struct SqliteStore {
    pub pool: SqlitePool,
    user_cache: Arc<Mutex<Cache<i64, User>>>,
    post_cache: Arc<Mutex<Cache<i64, Post>>>,
    followee_cache: Arc<Mutex<Cache<i64, Vec<i64>>>>,
    count_cache: Arc<Mutex<Cache<String, i64>>>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, cache_capacity: usize) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;

        Ok(SqliteStore {
            pool,
            user_cache: Arc::new(Mutex::new(Cache::new(cache_capacity))),
            post_cache: Arc::new(Mutex::new(Cache::new(cache_capacity))),
            followee_cache: Arc::new(Mutex::new(Cache::new(cache_capacity))),
            count_cache: Arc::new(Mutex::new(Cache::new(cache_capacity / 2))),
        })
    }

    pub async fn init(&self) -> Result<()> {
        // Identity store
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                bio TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Follow graph - one row per directed edge, no self-edges
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS follows (
                follower_id INTEGER NOT NULL,
                followee_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY(follower_id, followee_id),
                CHECK(follower_id <> followee_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        // Content store
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Like ledger - the UNIQUE constraint is what resolves racing
        // duplicate likes: the second committer hits it and loses
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS likes (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(user_id, post_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        // Notification sink - append-only
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY,
                recipient_id INTEGER NOT NULL,
                actor_id INTEGER NOT NULL,
                verb TEXT NOT NULL,
                target_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Query-path indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author_time ON posts(author_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post_time ON comments(post_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_recipient_time ON notifications(recipient_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SocialStore for SqliteStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, bio, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        self.user_cache.lock().await.insert(user.id, user.clone());

        Ok(())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        // Check cache first
        {
            let mut cache = self.user_cache.lock().await;
            if let Some(user) = cache.get(&id).cloned() {
                return Ok(Some(user));
            }
        }

        let row = sqlx::query(
            "SELECT id, username, email, bio, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let user = User {
                id: row.get("id"),
                username: row.get("username"),
                email: row.get("email"),
                bio: row.get("bio"),
                created_at: row.get("created_at"),
            };
            self.user_cache.lock().await.insert(id, user.clone());
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get(0);
        Ok(count > 0)
    }

    async fn add_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let now = Utc::now().timestamp();

        // INSERT OR IGNORE keeps re-follow a no-op at the store level
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;

        if inserted {
            self.followee_cache.lock().await.remove(&follower_id);
            let mut counts = self.count_cache.lock().await;
            counts.remove(&format!("following:{}", follower_id));
            counts.remove(&format!("followers:{}", followee_id));
        }

        Ok(inserted)
    }

    async fn remove_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected() > 0;

        if removed {
            self.followee_cache.lock().await.remove(&follower_id);
            let mut counts = self.count_cache.lock().await;
            counts.remove(&format!("following:{}", follower_id));
            counts.remove(&format!("followers:{}", followee_id));
        }

        Ok(removed)
    }

    async fn followees(&self, user_id: i64) -> Result<Vec<i64>> {
        // Check cache first
        {
            let mut cache = self.followee_cache.lock().await;
            if let Some(ids) = cache.get(&user_id).cloned() {
                return Ok(ids);
            }
        }

        let ids: Vec<i64> = sqlx::query(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get::<i64, _>(0))
        .collect();

        self.followee_cache.lock().await.insert(user_id, ids.clone());

        Ok(ids)
    }

    async fn follower_count(&self, user_id: i64) -> Result<i64> {
        let cache_key = format!("followers:{}", user_id);

        {
            let mut cache = self.count_cache.lock().await;
            if let Some(count) = cache.get(&cache_key).cloned() {
                return Ok(count);
            }
        }

        let row = sqlx::query("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get(0);

        self.count_cache.lock().await.insert(cache_key, count);
        Ok(count)
    }

    async fn followee_count(&self, user_id: i64) -> Result<i64> {
        let cache_key = format!("following:{}", user_id);

        {
            let mut cache = self.count_cache.lock().await;
            if let Some(count) = cache.get(&cache_key).cloned() {
                return Ok(count);
            }
        }

        let row = sqlx::query("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get(0);

        self.count_cache.lock().await.insert(cache_key, count);
        Ok(count)
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, title, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        self.post_cache.lock().await.insert(post.id, post.clone());

        Ok(())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        // Check cache first
        {
            let mut cache = self.post_cache.lock().await;
            if let Some(post) = cache.get(&id).cloned() {
                return Ok(Some(post));
            }
        }

        let row = sqlx::query(
            "SELECT id, author_id, title, content, created_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let post = Post {
                id: row.get("id"),
                author_id: row.get("author_id"),
                title: row.get("title"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            };
            self.post_cache.lock().await.insert(id, post.clone());
            Ok(Some(post))
        } else {
            Ok(None)
        }
    }

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<()> {
        sqlx::query("UPDATE posts SET title = ?, content = ? WHERE id = ?")
            .bind(title)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Invalidate cache
        self.post_cache.lock().await.remove(&id);

        Ok(())
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        // Atomic delete of the post and its attached rows. Notifications stay:
        // they are immutable history, never retracted.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        // Invalidate caches only after successful commit
        self.post_cache.lock().await.remove(&id);
        self.count_cache.lock().await.remove(&format!("likes:{}", id));

        Ok(())
    }

    async fn list_posts(&self, search: Option<&str>) -> Result<Vec<Post>> {
        let rows = match search {
            Some(term) => {
                let pattern = format!("%{}%", term.to_lowercase());
                sqlx::query(
                    "SELECT id, author_id, title, content, created_at FROM posts
                     WHERE lower(title) LIKE ? OR lower(content) LIKE ?
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(pattern.clone())
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, author_id, title, content, created_at FROM posts
                     ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut posts = Vec::new();
        for row in rows {
            posts.push(Post {
                id: row.get("id"),
                author_id: row.get("author_id"),
                title: row.get("title"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            });
        }

        Ok(posts)
    }

    async fn posts_by_authors(&self, author_ids: &[i64]) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no array binds; expand one placeholder per author
        let placeholders = vec!["?"; author_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, author_id, title, content, created_at FROM posts
             WHERE author_id IN ({}) ORDER BY created_at DESC, id DESC",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for author_id in author_ids {
            query = query.bind(author_id);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(Post {
                id: row.get("id"),
                author_id: row.get("author_id"),
                title: row.get("title"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            });
        }

        Ok(posts)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        }))
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<()> {
        sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, post_id, author_id, content, created_at FROM comments
             WHERE post_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            });
        }

        Ok(comments)
    }

    async fn create_like(&self, like: &Like, notification: Option<&Notification>) -> Result<bool> {
        // One transaction covers the like row and its notification; the
        // notification is written only after the insert survives the
        // UNIQUE(user_id, post_id) check, so a racing duplicate can produce
        // neither a second row nor a second notification.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO likes (id, user_id, post_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(like.id)
        .bind(like.user_id)
        .bind(like.post_id)
        .bind(like.created_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }

        if let Some(notification) = notification {
            sqlx::query(
                "INSERT INTO notifications (id, recipient_id, actor_id, verb, target_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(notification.id)
            .bind(notification.recipient_id)
            .bind(notification.actor_id)
            .bind(&notification.verb)
            .bind(notification.target_id)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        // Invalidate count cache only after successful commit
        self.count_cache
            .lock()
            .await
            .remove(&format!("likes:{}", like.post_id));

        Ok(true)
    }

    async fn remove_like(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;

        if removed {
            self.count_cache
                .lock()
                .await
                .remove(&format!("likes:{}", post_id));
        }

        Ok(removed)
    }

    async fn like_count(&self, post_id: i64) -> Result<i64> {
        let cache_key = format!("likes:{}", post_id);

        {
            let mut cache = self.count_cache.lock().await;
            if let Some(count) = cache.get(&cache_key).cloned() {
                return Ok(count);
            }
        }

        let row = sqlx::query("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get(0);

        self.count_cache.lock().await.insert(cache_key, count);
        Ok(count)
    }

    async fn notifications_for(&self, recipient_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, recipient_id, actor_id, verb, target_id, created_at FROM notifications
             WHERE recipient_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(Notification {
                id: row.get("id"),
                recipient_id: row.get("recipient_id"),
                actor_id: row.get("actor_id"),
                verb: row.get("verb"),
                target_id: row.get("target_id"),
                created_at: row.get("created_at"),
            });
        }

        Ok(notifications)
    }
}
