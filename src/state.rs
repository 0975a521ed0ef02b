use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::characters::{CharacterResolver, HttpCharacterSource};
use crate::config::Config;
use crate::error::{PortraitError, PortraitResult};
use crate::igdb::{GameMetadataResolver, IgdbClient, TokenCache, TwitchCredentialExchange};
use crate::imaging::{GenerationParams, HttpImageGenerator};
use crate::pipeline::PortraitPipeline;
use crate::text::{ensure_wordnet, KeywordExtractor, Lexicon, WordNetLexicon};

pub type LivePipeline =
    PortraitPipeline<IgdbClient<TwitchCredentialExchange>, HttpCharacterSource, HttpImageGenerator>;

pub struct AppState {
    pub pipeline: LivePipeline,
    pub output_dir: PathBuf,
    pub character_match_limit: usize,
}

/// Installs WordNet when missing and loads it. Keyword extraction has no
/// usable relevance filter without it, so failure stops start-up.
async fn load_lexicon(dir: &Path, url: &str) -> PortraitResult<Arc<dyn Lexicon>> {
    ensure_wordnet(dir, url).await?;
    let lexicon = WordNetLexicon::load_dir(dir).map_err(|err| {
        PortraitError::Lexicon(format!("Failed to read WordNet from {}: {err}", dir.display()))
    })?;
    if lexicon.is_empty() {
        return Err(PortraitError::Lexicon(format!(
            "WordNet index in {} has no entries",
            dir.display()
        )));
    }
    info!("Loaded WordNet index from {}", dir.display());
    Ok(Arc::new(lexicon))
}

impl AppState {
    pub async fn new(config: &Config) -> PortraitResult<Self> {
        let exchange = TwitchCredentialExchange::new(
            &config.twitch_token_url,
            &config.twitch_client_id,
            &config.twitch_client_secret,
        );
        let tokens = Arc::new(TokenCache::new(exchange));
        let igdb = IgdbClient::new(&config.igdb_base_url, &config.twitch_client_id, tokens)?;

        let games = GameMetadataResolver::new(
            igdb,
            KeywordExtractor::new(load_lexicon(&config.wordnet_dir, &config.wordnet_url).await?),
            Duration::from_secs(config.game_cache_ttl_seconds),
        );
        let characters = CharacterResolver::new(
            HttpCharacterSource::new(&config.character_list_url),
            Duration::from_secs(config.character_list_cache_ttl_seconds),
        );
        let generator = HttpImageGenerator::new(
            &config.image_api_url,
            Duration::from_secs(config.image_timeout_seconds),
        );
        let params = GenerationParams {
            width: config.image_width,
            height: config.image_height,
            guidance_scale: config.image_guidance_scale,
            inference_steps: config.image_steps,
        };

        Ok(AppState {
            pipeline: PortraitPipeline::new(games, characters, generator, params),
            output_dir: config.output_dir.clone(),
            character_match_limit: config.character_match_limit,
        })
    }
}
