// Seeds a handful of demo users, follows, posts and likes so the server has
// something to show. Run against a fresh database; duplicate likes and
// re-follows on rerun are skipped.

use rand::Rng;

use pulse_api::{app_state::AppState, config::Config, error::AppResult};

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Seeding demo data for Pulse");

    let config = Config::from_env()?;
    let state = AppState::new(config).await?;

    let names = ["alice", "bob", "carol", "dave", "erin", "frank"];
    let mut users = Vec::new();

    for name in names {
        let user = state
            .accounts
            .register(name, &format!("{}@example.com", name), "demo account")
            .await?;
        println!("✅ Created user {} ({})", user.username, user.id);
        users.push(user);
    }

    let mut rng = rand::rng();

    // Everyone follows a few random others
    for user in &users {
        for _ in 0..3 {
            let target = &users[rng.random_range(0..users.len())];
            if target.id == user.id {
                continue;
            }
            state.accounts.follow(user.id, target.id).await?;
        }
    }
    println!("✅ Wired up the follow graph");

    // A few posts per user
    let mut posts = Vec::new();
    for user in &users {
        for n in 0..rng.random_range(2..5) {
            let post = state
                .content
                .create_post(
                    user.id,
                    &format!("{}'s post #{}", user.username, n + 1),
                    "Hello from the demo seeder.",
                )
                .await?;
            posts.push(post);
        }
    }
    println!("✅ Created {} posts", posts.len());

    // Random likes; duplicates lose against the ledger and are skipped
    let mut likes = 0;
    for _ in 0..posts.len() * 2 {
        let user = &users[rng.random_range(0..users.len())];
        let post = &posts[rng.random_range(0..posts.len())];
        match state.engagement.like(user.id, post.id).await {
            Ok(_) => likes += 1,
            Err(err) => tracing::debug!("Skipping like: {}", err),
        }
    }
    println!("✅ Recorded {} likes", likes);

    println!("🎉 Demo data ready");

    Ok(())
}
