pub mod auth;
pub mod client;
pub mod resolver;

pub use auth::{TokenCache, TwitchCredentialExchange};
pub use client::{GameDatabase, IgdbClient};
pub use resolver::{GameKeywords, GameMetadataResolver};
