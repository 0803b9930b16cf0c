// HTTP-level checks: viewer gating, authorship policy, error mapping.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use pulse_api::{
    api::create_api_router,
    app_state::AppState,
    config::{CacheConfig, Config, DatabaseConfig, ServerConfig},
};

struct TestServer {
    _dir: TempDir,
    router: Router,
}

async fn test_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let config = Config {
        database: DatabaseConfig {
            url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("api.db").display()
            ),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        cache: CacheConfig { capacity: 64 },
    };

    let state = AppState::new(config).await.unwrap();
    TestServer {
        _dir: dir,
        router: create_api_router(state),
    }
}

async fn send(
    server: &TestServer,
    method: &str,
    uri: &str,
    viewer: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(viewer_id) = viewer {
        builder = builder.header("x-viewer-id", viewer_id.to_string());
    }

    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = server.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn register(server: &TestServer, name: &str) -> i64 {
    let (status, body) = send(
        server,
        "POST",
        "/accounts/register",
        None,
        Some(json!({"username": name, "email": format!("{}@example.com", name)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn author_spoofing_is_rejected() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;

    // The request claims a different author; the viewer wins
    let (status, body) = send(
        &server,
        "POST",
        "/posts",
        Some(alice),
        Some(json!({"title": "Hello", "content": "world", "author_id": 999_999})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author_id"].as_i64().unwrap(), alice);

    let post_id = body["id"].as_i64().unwrap();
    let (status, body) = send(&server, "GET", &format!("/posts/{}", post_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author_id"].as_i64().unwrap(), alice);
    assert_eq!(body["title"], "Hello");
}

#[tokio::test]
async fn anonymous_callers_cannot_mutate_but_can_read() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;

    let (status, _) = send(
        &server,
        "POST",
        "/posts",
        None,
        Some(json!({"title": "x", "content": "y"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &server,
        "POST",
        &format!("/users/{}/follow", alice),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&server, "GET", "/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&server, "GET", &format!("/users/{}", alice), None, None).await;
    assert_eq!(status, StatusCode::OK);

    // The feed is viewer-relative, so it is gated too
    let (status, _) = send(&server, "GET", "/feed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let (_, post) = send(
        &server,
        "POST",
        "/posts",
        Some(alice),
        Some(json!({"title": "mine", "content": "text"})),
    )
    .await;
    let post_id = post["id"].as_i64().unwrap();

    let (status, _) = send(
        &server,
        "PUT",
        &format!("/posts/{}", post_id),
        Some(bob),
        Some(json!({"title": "stolen", "content": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &server,
        "DELETE",
        &format!("/posts/{}", post_id),
        Some(bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &server,
        "PUT",
        &format!("/posts/{}", post_id),
        Some(alice),
        Some(json!({"title": "edited", "content": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "edited");
    // Author survives the edit untouched
    assert_eq!(body["author_id"].as_i64().unwrap(), alice);
}

#[tokio::test]
async fn duplicate_like_maps_to_conflict() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let (_, post) = send(
        &server,
        "POST",
        "/posts",
        Some(bob),
        Some(json!({"title": "hi", "content": "text"})),
    )
    .await;
    let post_id = post["id"].as_i64().unwrap();

    let (status, _) = send(
        &server,
        "POST",
        &format!("/posts/{}/like", post_id),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &server,
        "POST",
        &format!("/posts/{}/like", post_id),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &server,
        "GET",
        &format!("/posts/{}/likes", post_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"].as_i64().unwrap(), 1);

    // Unlike without a like is a 404-class client error
    let (status, _) = send(
        &server,
        "POST",
        &format!("/posts/{}/unlike", post_id),
        Some(bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_and_notifications_flow() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let (_, post) = send(
        &server,
        "POST",
        "/posts",
        Some(bob),
        Some(json!({"title": "from bob", "content": "text"})),
    )
    .await;
    let post_id = post["id"].as_i64().unwrap();

    let (status, _) = send(
        &server,
        "POST",
        &format!("/users/{}/follow", bob),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&server, "GET", "/feed", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"].as_i64().unwrap(), post_id);

    let (status, _) = send(
        &server,
        "POST",
        &format!("/posts/{}/like", post_id),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&server, "GET", "/notifications", Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["actor_id"].as_i64().unwrap(), alice);
    assert_eq!(notifications[0]["verb"], "liked your post");
}

#[tokio::test]
async fn missing_resources_map_to_not_found() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;

    let (status, _) = send(&server, "GET", "/posts/12345", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &server,
        "POST",
        "/users/12345/follow",
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Self-follow is rejected as a validation error
    let (status, _) = send(
        &server,
        "POST",
        &format!("/users/{}/follow", alice),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
