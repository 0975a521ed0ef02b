use image::DynamicImage;
use tracing::{info, warn};

use crate::characters::{CharacterResolver, CharacterSource};
use crate::error::PortraitResult;
use crate::igdb::{GameDatabase, GameKeywords, GameMetadataResolver};
use crate::imaging::{GenerationParams, ImageGenerator};
use crate::prompt::{build_prompts, PromptSpec, StyleOptions};
use crate::utils::timing::RequestTimer;

#[derive(Debug, Clone)]
pub struct PortraitRequest {
    pub character: String,
    pub game: String,
    pub style: StyleOptions,
    pub variants: usize,
}

/// Everything known before the image backend is involved.
#[derive(Debug, Clone)]
pub struct PreparedPortrait {
    pub game: GameKeywords,
    pub characters: Vec<String>,
    pub prompts: Vec<PromptSpec>,
}

#[derive(Debug)]
pub enum PortraitOutcome<T> {
    Ready(T),
    GameNotFound,
}

pub struct PortraitPipeline<D, S, G> {
    games: GameMetadataResolver<D>,
    characters: CharacterResolver<S>,
    generator: G,
    params: GenerationParams,
}

impl<D, S, G> PortraitPipeline<D, S, G>
where
    D: GameDatabase,
    S: CharacterSource,
    G: ImageGenerator,
{
    pub fn new(
        games: GameMetadataResolver<D>,
        characters: CharacterResolver<S>,
        generator: G,
        params: GenerationParams,
    ) -> Self {
        PortraitPipeline {
            games,
            characters,
            generator,
            params,
        }
    }

    /// Resolves the game and the character concurrently and assembles one
    /// prompt per matched character variant.
    pub async fn prepare(
        &self,
        request: &PortraitRequest,
    ) -> PortraitResult<PortraitOutcome<PreparedPortrait>> {
        let (game, characters) = tokio::join!(
            self.games.game_keywords(&request.game),
            self.characters
                .resolve_characters(&request.character, request.variants.max(1)),
        );

        let Some(game) = game? else {
            return Ok(PortraitOutcome::GameNotFound);
        };

        let mut characters = characters?;
        if characters.is_empty() {
            warn!(
                "No character matched '{}'; using the name as given",
                request.character
            );
            characters.push(request.character.clone());
        }

        let prompts = build_prompts(&game, &characters, &request.style);
        Ok(PortraitOutcome::Ready(PreparedPortrait {
            game,
            characters,
            prompts,
        }))
    }

    /// Generates every variant before returning, so a failure part way
    /// through leaves nothing to write.
    pub async fn render(&self, prepared: &PreparedPortrait) -> PortraitResult<Vec<DynamicImage>> {
        let mut images = Vec::new();
        for (position, prompt) in prepared.prompts.iter().enumerate() {
            info!(
                "Generating variant {}/{} for '{}'",
                position + 1,
                prepared.prompts.len(),
                prompt.character_descriptor
            );
            images.extend(self.generator.generate(prompt, &self.params).await?);
        }
        Ok(images)
    }

    pub async fn generate(
        &self,
        request: &PortraitRequest,
    ) -> PortraitResult<PortraitOutcome<(PreparedPortrait, Vec<DynamicImage>)>> {
        let mut timer = RequestTimer::start(&request.character, &request.game);

        let prepared = match self.prepare(request).await {
            Ok(PortraitOutcome::Ready(prepared)) => prepared,
            Ok(PortraitOutcome::GameNotFound) => {
                timer.complete("not_found", Some(format!("game={}", request.game)));
                return Ok(PortraitOutcome::GameNotFound);
            }
            Err(err) => {
                timer.complete("error", Some(err.to_string()));
                return Err(err);
            }
        };

        match self.render(&prepared).await {
            Ok(images) => {
                timer.complete("success", Some(format!("images={}", images.len())));
                Ok(PortraitOutcome::Ready((prepared, images)))
            }
            Err(err) => {
                timer.complete("error", Some(err.to_string()));
                Err(err)
            }
        }
    }
}
