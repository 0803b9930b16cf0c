// Account registration and the follow graph.
// Credential validation and token issuance live in the upstream gateway;
// this service only owns the profile row and the directed follow edges.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    id_generator::IdGenerator,
    models::{User, UserProfile},
    store::SocialStore,
};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").unwrap());

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn SocialStore>,
    id_generator: Arc<IdGenerator>,
}

impl AccountService {
    pub fn new(store: Arc<dyn SocialStore>, id_generator: Arc<IdGenerator>) -> Self {
        Self {
            store,
            id_generator,
        }
    }

    pub async fn register(&self, username: &str, email: &str, bio: &str) -> AppResult<User> {
        if !USERNAME_RE.is_match(username) {
            return Err(AppError::Validation(
                "username must be 3-32 characters of letters, digits or underscores".to_string(),
            ));
        }

        if self.store.username_exists(username).await? {
            return Err(AppError::Duplicate(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let user = User {
            id: self.id_generator.next_id(),
            username: username.to_string(),
            email: email.to_string(),
            bio: bio.to_string(),
            created_at: Utc::now().timestamp(),
        };

        self.store.create_user(&user).await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);

        Ok(user)
    }

    pub async fn profile(&self, user_id: i64) -> AppResult<UserProfile> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let followers = self.store.follower_count(user_id).await?;
        let following = self.store.followee_count(user_id).await?;

        Ok(UserProfile {
            user,
            followers,
            following,
        })
    }

    /// Adds `target` to the actor's followee set. Re-following is a no-op
    /// success; self-follow is rejected outright.
    pub async fn follow(&self, actor_id: i64, target_id: i64) -> AppResult<()> {
        if actor_id == target_id {
            return Err(AppError::Validation(
                "cannot follow yourself".to_string(),
            ));
        }

        if self.store.get_user(target_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                target_id
            )));
        }

        let added = self.store.add_follow(actor_id, target_id).await?;
        if added {
            tracing::info!("User {} now follows {}", actor_id, target_id);
        }

        Ok(())
    }

    /// Removes `target` from the actor's followee set. Unfollowing someone
    /// the actor never followed is a no-op success.
    pub async fn unfollow(&self, actor_id: i64, target_id: i64) -> AppResult<()> {
        if self.store.get_user(target_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                target_id
            )));
        }

        self.store.remove_follow(actor_id, target_id).await?;

        Ok(())
    }

    pub async fn followees(&self, user_id: i64) -> AppResult<Vec<i64>> {
        Ok(self.store.followees(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_shape() {
        assert!(USERNAME_RE.is_match("alice"));
        assert!(USERNAME_RE.is_match("alice_99"));
        assert!(!USERNAME_RE.is_match("al"));
        assert!(!USERNAME_RE.is_match("alice bob"));
        assert!(!USERNAME_RE.is_match("a".repeat(33).as_str()));
    }
}
