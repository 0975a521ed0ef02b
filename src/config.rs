use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_IGDB_BASE_URL: &str = "https://api.igdb.com/v4/";
pub const DEFAULT_CHARACTER_LIST_URL: &str =
    "https://huggingface.co/spaces/cagliostrolab/animagine-xl-3.1/raw/main/wildcard/characterfull.txt";

pub const DEFAULT_WORDNET_URL: &str =
    "https://raw.githubusercontent.com/nltk/nltk_data/gh-pages/packages/corpora/wordnet.zip";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub twitch_client_id: String,
    pub twitch_client_secret: String,
    pub twitch_token_url: String,
    pub igdb_base_url: String,
    pub character_list_url: String,
    pub character_list_cache_ttl_seconds: u64,
    pub game_cache_ttl_seconds: u64,
    pub character_match_limit: usize,
    pub wordnet_dir: PathBuf,
    pub wordnet_url: String,
    pub image_api_url: String,
    pub image_timeout_seconds: u64,
    pub image_width: u32,
    pub image_height: u32,
    pub image_guidance_scale: f32,
    pub image_steps: u32,
    pub output_dir: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

/// IGDB endpoints are joined relative to the base, which only works when the
/// base ends with a slash.
fn normalize_base_url(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

fn clamp_dimension(name: &str, value: u32) -> u32 {
    // Diffusion backends work in latent blocks of 8 pixels.
    let clamped = value.clamp(64, 4096) / 8 * 8;
    if clamped != value {
        warn!("{name}={value} adjusted to {clamped}");
    }
    clamped
}

impl Config {
    pub fn load() -> Result<Self> {
        let twitch_client_id = env_string("TWITCH_CLIENT_ID", "");
        let twitch_client_secret = env_string("TWITCH_CLIENT_SECRET", "");
        if twitch_client_id.trim().is_empty() || twitch_client_secret.trim().is_empty() {
            warn!("TWITCH_CLIENT_ID / TWITCH_CLIENT_SECRET are not set; game lookups will fail");
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            twitch_client_id: twitch_client_id.trim().to_string(),
            twitch_client_secret: twitch_client_secret.trim().to_string(),
            twitch_token_url: env_string("TWITCH_TOKEN_URL", DEFAULT_TWITCH_TOKEN_URL),
            igdb_base_url: normalize_base_url(env_string("IGDB_BASE_URL", DEFAULT_IGDB_BASE_URL)),
            character_list_url: env_string("CHARACTER_LIST_URL", DEFAULT_CHARACTER_LIST_URL),
            character_list_cache_ttl_seconds: env_u64("CHARACTER_LIST_CACHE_TTL_SECONDS", 3600),
            game_cache_ttl_seconds: env_u64("GAME_CACHE_TTL_SECONDS", 3600),
            character_match_limit: env_usize("CHARACTER_MATCH_LIMIT", 3).max(1),
            wordnet_dir: PathBuf::from(env_string("WORDNET_DIR", "wordnet")),
            wordnet_url: env_string("WORDNET_URL", DEFAULT_WORDNET_URL),
            image_api_url: env_string("IMAGE_API_URL", "http://127.0.0.1:7860/sdapi/v1/txt2img"),
            image_timeout_seconds: env_u64("IMAGE_TIMEOUT_SECONDS", 600),
            image_width: clamp_dimension("IMAGE_WIDTH", env_u32("IMAGE_WIDTH", 1024)),
            image_height: clamp_dimension("IMAGE_HEIGHT", env_u32("IMAGE_HEIGHT", 1024)),
            image_guidance_scale: env_f32("IMAGE_GUIDANCE_SCALE", 7.0),
            image_steps: env_u32("IMAGE_STEPS", 28).max(1),
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", "output")),
        })
    }
}
