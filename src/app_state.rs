use std::sync::Arc;

use crate::{
    config::Config,
    database::SqliteStore,
    id_generator::IdGenerator,
    services::{AccountService, ContentService, EngagementService, FeedService},
    store::SocialStore,
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub content: ContentService,
    pub engagement: EngagementService,
    pub feed: FeedService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize the store
        let store = SqliteStore::new(&config.database.url, config.cache.capacity).await?;
        store.init().await?;
        let store: Arc<dyn SocialStore> = Arc::new(store);

        // Single-node deployment: node 0
        let id_generator = Arc::new(IdGenerator::new(0));

        Ok(Self {
            accounts: AccountService::new(store.clone(), id_generator.clone()),
            content: ContentService::new(store.clone(), id_generator.clone()),
            engagement: EngagementService::new(store.clone(), id_generator.clone()),
            feed: FeedService::new(store),
            config,
        })
    }
}
