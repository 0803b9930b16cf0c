// Domain services - each owns one slice of the social graph

pub mod accounts;
pub mod content;
pub mod engagement;
pub mod feed;

pub use accounts::AccountService;
pub use content::ContentService;
pub use engagement::EngagementService;
pub use feed::FeedService;
