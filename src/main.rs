// Pulse API Server - follow graph, feeds, likes and notifications

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use pulse_api::{api::create_api_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    // Build main application router
    let app = Router::new()
        .nest("/api/v1", create_api_router(app_state))
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    println!("🚀 Pulse API Server starting on http://{}", addr);
    println!("📋 API Documentation:");
    println!("  POST   /api/v1/accounts/register      - Register a user");
    println!("  GET    /api/v1/users/{{id}}             - Profile with follow counts");
    println!("  POST   /api/v1/users/{{id}}/follow      - Follow a user");
    println!("  POST   /api/v1/users/{{id}}/unfollow    - Unfollow a user");
    println!("  GET    /api/v1/posts?search=           - List posts");
    println!("  POST   /api/v1/posts                   - Create post");
    println!("  GET    /api/v1/posts/{{id}}/comments    - Comments on a post");
    println!("  POST   /api/v1/posts/{{id}}/like        - Like a post");
    println!("  POST   /api/v1/posts/{{id}}/unlike      - Unlike a post");
    println!("  GET    /api/v1/feed                    - Posts from followed users");
    println!("  GET    /api/v1/notifications           - Viewer notifications");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
