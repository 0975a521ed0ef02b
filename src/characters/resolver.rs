use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::characters::fuzzy::partial_token_sort_ratio;
use crate::error::{PortraitError, PortraitResult};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_call_timing;

/// Candidates scoring below this are never returned.
pub const SCORE_CUTOFF: u8 = 50;
/// A best score at or above this is unambiguous; other candidates are dropped.
pub const CONFIDENT_SCORE: u8 = 90;

const LIST_TIMEOUT_SECONDS: u64 = 3;

/// Supplier of the newline-delimited character descriptor list.
pub trait CharacterSource: Send + Sync {
    fn fetch_list(&self) -> impl Future<Output = PortraitResult<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpCharacterSource {
    url: String,
}

impl HttpCharacterSource {
    pub fn new(url: &str) -> Self {
        HttpCharacterSource {
            url: url.to_string(),
        }
    }
}

impl CharacterSource for HttpCharacterSource {
    async fn fetch_list(&self) -> PortraitResult<String> {
        info!("Fetching character list from {}", self.url);
        log_call_timing("characters", "list", None, || async {
            let response = get_http_client()
                .get(&self.url)
                .timeout(Duration::from_secs(LIST_TIMEOUT_SECONDS))
                .send()
                .await
                .map_err(|err| {
                    PortraitError::ReferenceListUnavailable(format!("Character list request failed: {err}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(PortraitError::ReferenceListUnavailable(format!(
                    "Character list request failed with status {status}"
                )));
            }

            response.text().await.map_err(|err| {
                PortraitError::ReferenceListUnavailable(format!("Invalid character list response: {err}"))
            })
        })
        .await
    }
}

pub fn parse_character_list(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Every candidate scoring at least the cutoff, best first. Equal scores
/// keep their list order.
pub fn rank_candidates(query: &str, candidates: &[String]) -> Vec<(String, u8)> {
    let query = query.to_lowercase();
    let mut scored: Vec<(String, u8)> = candidates
        .iter()
        .map(|candidate| (candidate, partial_token_sort_ratio(&query, candidate)))
        .filter(|(_, score)| *score >= SCORE_CUTOFF)
        .map(|(candidate, score)| (candidate.clone(), score))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

pub struct CharacterResolver<S> {
    source: S,
    list: TtlCache<(), Arc<Vec<String>>>,
}

impl<S: CharacterSource> CharacterResolver<S> {
    pub fn new(source: S, cache_ttl: Duration) -> Self {
        CharacterResolver {
            source,
            list: TtlCache::new(cache_ttl),
        }
    }

    pub async fn all_characters(&self) -> PortraitResult<Arc<Vec<String>>> {
        self.list
            .get_or_try_insert_with((), || async {
                let raw = self.source.fetch_list().await?;
                let characters = parse_character_list(&raw);
                if characters.is_empty() {
                    return Err(PortraitError::ReferenceListUnavailable(
                        "Character list is empty".to_string(),
                    ));
                }
                info!("Loaded {} character descriptors", characters.len());
                Ok(Arc::new(characters))
            })
            .await
    }

    /// Closest descriptor for `query`, or `None` when nothing clears the cutoff.
    pub async fn resolve_character(&self, query: &str) -> PortraitResult<Option<String>> {
        let characters = self.all_characters().await?;
        let best = rank_candidates(query, &characters).into_iter().next();
        match &best {
            Some((descriptor, score)) => {
                debug!("Best match for '{}': '{}' ({})", query, descriptor, score)
            }
            None => info!("No character matched '{}'", query),
        }
        Ok(best.map(|(descriptor, _)| descriptor))
    }

    /// Up to `limit` descriptors, best first. A confident best match is
    /// returned on its own.
    pub async fn resolve_characters(&self, query: &str, limit: usize) -> PortraitResult<Vec<String>> {
        let characters = self.all_characters().await?;
        let mut ranked = rank_candidates(query, &characters);
        ranked.truncate(limit);
        if let Some((descriptor, score)) = ranked.first() {
            if *score >= CONFIDENT_SCORE {
                debug!("Confident match for '{}': '{}' ({})", query, descriptor, score);
                ranked.truncate(1);
            }
        }
        info!("Character matches for '{}': {:?}", query, ranked);
        Ok(ranked.into_iter().map(|(descriptor, _)| descriptor).collect())
    }
}
