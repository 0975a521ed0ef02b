use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::error::PortraitResult;
use crate::igdb::client::{GameDatabase, GameFacts};
use crate::recency::RecencyBucket;
use crate::text::KeywordExtractor;

/// What the prompt needs to know about a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameKeywords {
    pub name: String,
    pub recency: RecencyBucket,
    /// Genre names and summary keywords, duplicates collapsed.
    pub keywords: BTreeSet<String>,
}

pub struct GameMetadataResolver<D> {
    database: D,
    extractor: KeywordExtractor,
    games: TtlCache<String, Option<GameFacts>>,
    genres: TtlCache<Vec<u64>, Vec<String>>,
}

fn cache_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl<D: GameDatabase> GameMetadataResolver<D> {
    pub fn new(database: D, extractor: KeywordExtractor, cache_ttl: Duration) -> Self {
        GameMetadataResolver {
            database,
            extractor,
            games: TtlCache::new(cache_ttl),
            genres: TtlCache::new(cache_ttl),
        }
    }

    pub async fn resolve_game(&self, name: &str) -> PortraitResult<Option<GameFacts>> {
        let game = self
            .games
            .get_or_try_insert_with(cache_key(name), || self.database.find_game(name))
            .await?;
        if game.is_none() {
            info!("Game with name '{}' not found", name);
        }
        Ok(game)
    }

    async fn genre_names(&self, ids: &[u64]) -> PortraitResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.genres
            .get_or_try_insert_with(ids.to_vec(), || self.database.genre_names(ids))
            .await
    }

    /// Recency bucket plus genre/summary keywords for `name`; `None` when the
    /// game is unknown to the service.
    pub async fn game_keywords(&self, name: &str) -> PortraitResult<Option<GameKeywords>> {
        let Some(game) = self.resolve_game(name).await? else {
            return Ok(None);
        };

        let recency = RecencyBucket::from_release_timestamp(game.first_release_date);
        let genres = match game.genres.as_deref() {
            Some(ids) => self.genre_names(ids).await?,
            None => Vec::new(),
        };
        let summary_keywords = self.extractor.summary_keywords(&game.summary);
        if summary_keywords.is_empty() && !game.summary.trim().is_empty() {
            warn!("No usable keywords found in the summary of '{}'", game.name);
        }

        let keywords: BTreeSet<String> = genres.into_iter().chain(summary_keywords).collect();
        info!(
            "Resolved game '{}': recency={} keywords={:?}",
            game.name, recency, keywords
        );

        Ok(Some(GameKeywords {
            name: game.name,
            recency,
            keywords,
        }))
    }
}
