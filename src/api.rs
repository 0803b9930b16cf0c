// HTTP dispatch layer for the social graph service.
// Resolves the viewer, enforces the authentication and authorship gates,
// then hands plain arguments to the domain services.

use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    services::content::is_author,
    viewer::ViewerContext,
};

// HTTP Request/Response types

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    // Accepted but never honored: authorship always comes from the viewer
    #[serde(default)]
    pub author_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    pub author_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub search: Option<String>,
}

// Account handlers

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<Value>> {
    let user = state
        .accounts
        .register(&req.username, &req.email, &req.bio)
        .await?;
    Ok(Json(json!(user)))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let profile = state.accounts.profile(id).await?;
    Ok(Json(json!(profile)))
}

pub async fn follow_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let actor_id = viewer.require_authenticated()?;
    state.accounts.follow(actor_id, id).await?;
    Ok(Json(json!({"follower_id": actor_id, "followee_id": id, "following": true})))
}

pub async fn unfollow_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let actor_id = viewer.require_authenticated()?;
    state.accounts.unfollow(actor_id, id).await?;
    Ok(Json(json!({"follower_id": actor_id, "followee_id": id, "following": false})))
}

// Post handlers

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListPostsQuery>,
) -> AppResult<Json<Value>> {
    let posts = state.content.list_posts(params.search.as_deref()).await?;
    Ok(Json(json!({"posts": posts})))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Json<Value>> {
    let author_id = viewer.require_authenticated()?;
    let post = state
        .content
        .create_post(author_id, &req.title, &req.content)
        .await?;
    Ok(Json(json!(post)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let post = state.content.get_post(id).await?;
    Ok(Json(json!(post)))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let post = state.content.get_post(id).await?;

    if !is_author(viewer_id, post.author_id) {
        return Err(AppError::Forbidden(
            "only the author can edit this post".to_string(),
        ));
    }

    let post = state.content.update_post(id, &req.title, &req.content).await?;
    Ok(Json(json!(post)))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let post = state.content.get_post(id).await?;

    if !is_author(viewer_id, post.author_id) {
        return Err(AppError::Forbidden(
            "only the author can delete this post".to_string(),
        ));
    }

    state.content.delete_post(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// Comment handlers

pub async fn list_comments_handler(
    State(state): State<AppState>,
    AxumPath(post_id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let comments = state.content.comments_for_post(post_id).await?;
    Ok(Json(json!({"comments": comments})))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(post_id): AxumPath<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Json<Value>> {
    let author_id = viewer.require_authenticated()?;
    let comment = state
        .content
        .create_comment(author_id, post_id, &req.content)
        .await?;
    Ok(Json(json!(comment)))
}

pub async fn update_comment_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let comment = state.content.get_comment(id).await?;

    if !is_author(viewer_id, comment.author_id) {
        return Err(AppError::Forbidden(
            "only the author can edit this comment".to_string(),
        ));
    }

    let comment = state.content.update_comment(id, &req.content).await?;
    Ok(Json(json!(comment)))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let comment = state.content.get_comment(id).await?;

    if !is_author(viewer_id, comment.author_id) {
        return Err(AppError::Forbidden(
            "only the author can delete this comment".to_string(),
        ));
    }

    state.content.delete_comment(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// Engagement handlers

pub async fn like_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(post_id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let actor_id = viewer.require_authenticated()?;
    let like = state.engagement.like(actor_id, post_id).await?;
    Ok(Json(json!(like)))
}

pub async fn unlike_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
    AxumPath(post_id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let actor_id = viewer.require_authenticated()?;
    state.engagement.unlike(actor_id, post_id).await?;
    Ok(Json(json!({"post_id": post_id, "liked": false})))
}

pub async fn like_count_handler(
    State(state): State<AppState>,
    AxumPath(post_id): AxumPath<i64>,
) -> AppResult<Json<Value>> {
    let count = state.engagement.like_count(post_id).await?;
    Ok(Json(json!({"post_id": post_id, "likes": count})))
}

// Feed and notification handlers

pub async fn feed_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let posts = state.feed.feed(viewer_id).await?;
    Ok(Json(json!({"posts": posts})))
}

pub async fn notifications_handler(
    State(state): State<AppState>,
    viewer: ViewerContext,
) -> AppResult<Json<Value>> {
    let viewer_id = viewer.require_authenticated()?;
    let notifications = state.engagement.notifications(viewer_id).await?;
    Ok(Json(json!({"notifications": notifications})))
}

// Create unified router

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        // Accounts and follow graph
        .route("/accounts/register", post(register_handler))
        .route("/users/{id}", get(get_profile_handler))
        .route("/users/{id}/follow", post(follow_handler))
        .route("/users/{id}/unfollow", post(unfollow_handler))
        // Posts
        .route("/posts", get(list_posts_handler))
        .route("/posts", post(create_post_handler))
        .route("/posts/{id}", get(get_post_handler))
        .route("/posts/{id}", put(update_post_handler))
        .route("/posts/{id}", delete(delete_post_handler))
        // Comments
        .route("/posts/{id}/comments", get(list_comments_handler))
        .route("/posts/{id}/comments", post(create_comment_handler))
        .route("/comments/{id}", put(update_comment_handler))
        .route("/comments/{id}", delete(delete_comment_handler))
        // Engagement
        .route("/posts/{id}/like", post(like_handler))
        .route("/posts/{id}/unlike", post(unlike_handler))
        .route("/posts/{id}/likes", get(like_count_handler))
        // Feed and notifications
        .route("/feed", get(feed_handler))
        .route("/notifications", get(notifications_handler))
        .with_state(state)
}
