use anyhow::{anyhow, Context};
use chrono::Local;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

mod cache;
mod characters;
mod config;
mod error;
mod igdb;
mod imaging;
mod pipeline;
mod prompt;
mod recency;
mod state;
mod text;
mod utils;

use config::CONFIG;
use imaging::{save_images, OutputNamer};
use pipeline::{PortraitOutcome, PortraitRequest};
use prompt::StyleOptions;
use state::AppState;
use utils::logging::init_logging;

fn usage() -> &'static str {
    "Usage: game-portrait [--character <name>] [--game <name>] [--gender <tag>] [--expression <tag>] [--looking-at <tag>] [--setting <indoors|outdoors>] [--time <day|night>] [--tags <a,b,...>] [--variants <n>] [--timestamp] [--dry-run]"
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    character: Option<String>,
    game: Option<String>,
    gender: Option<String>,
    expression: Option<String>,
    looking_at: Option<String>,
    setting: Option<String>,
    time: Option<String>,
    tags: Vec<String>,
    variants: Option<usize>,
    timestamp: bool,
    dry_run: bool,
}

fn parse_cli_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();

    let mut index = 1;
    while index < args.len() {
        let flag = args[index].as_str();
        let mut value = || -> anyhow::Result<String> {
            index += 1;
            args.get(index)
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {flag}"))
        };
        match flag {
            "--character" => parsed.character = Some(value()?),
            "--game" => parsed.game = Some(value()?),
            "--gender" => parsed.gender = Some(value()?),
            "--expression" => parsed.expression = Some(value()?),
            "--looking-at" => parsed.looking_at = Some(value()?),
            "--setting" => parsed.setting = Some(value()?),
            "--time" => parsed.time = Some(value()?),
            "--tags" => parsed.tags = StyleOptions::parse_tags(&value()?),
            "--variants" => {
                let raw = value()?;
                let variants = raw
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid --variants value: {raw}"))?;
                parsed.variants = Some(variants.max(1));
            }
            "--timestamp" => parsed.timestamp = true,
            "--dry-run" => parsed.dry_run = true,
            "--help" | "-h" => return Err(anyhow!(usage())),
            other => return Err(anyhow!("Unknown argument: {other}\n{}", usage())),
        }
        index += 1;
    }

    Ok(parsed)
}

/// Lowercases, turns commas into spaces and drops anything outside ASCII.
fn normalize_name(raw: &str) -> String {
    raw.to_lowercase()
        .replace(',', " ")
        .chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_string()
}

async fn ask(question: &str) -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

async fn name_or_ask(given: Option<String>, question: &str) -> anyhow::Result<String> {
    let raw = match given {
        Some(value) => value,
        None => ask(question).await?,
    };
    let name = normalize_name(&raw);
    if name.is_empty() {
        return Err(anyhow!("A non-empty name is required"));
    }
    Ok(name)
}

fn style_from_args(args: &CliArgs) -> StyleOptions {
    let defaults = StyleOptions::default();
    StyleOptions {
        gender: args.gender.clone().unwrap_or(defaults.gender),
        facial_expression: args.expression.clone().unwrap_or(defaults.facial_expression),
        looking_at: args.looking_at.clone().unwrap_or(defaults.looking_at),
        indoors: args.setting.clone().unwrap_or(defaults.indoors),
        daytime: args.time.clone().unwrap_or(defaults.daytime),
        additional_tags: args.tags.clone(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_cli_args(&args)?;

    let state = AppState::new(&CONFIG).await?;
    let character = name_or_ask(cli.character.clone(), "Enter the anime character name: ").await?;
    let game = name_or_ask(cli.game.clone(), "Enter the video game name: ").await?;
    let request = PortraitRequest {
        character,
        game,
        style: style_from_args(&cli),
        variants: cli.variants.unwrap_or(state.character_match_limit),
    };
    info!(
        "Portrait request: character='{}' game='{}' variants={}",
        request.character, request.game, request.variants
    );

    if cli.dry_run {
        let prepared = match state.pipeline.prepare(&request).await? {
            PortraitOutcome::Ready(prepared) => prepared,
            PortraitOutcome::GameNotFound => {
                return Err(anyhow!("Game '{}' was not found on IGDB", request.game));
            }
        };
        for prompt in &prepared.prompts {
            println!("{}", prompt.prompt());
        }
        println!("Negative prompt: {}", prompt::NEGATIVE_PROMPT);
        return Ok(());
    }

    let images = match state.pipeline.generate(&request).await {
        Ok(PortraitOutcome::Ready((_, images))) => images,
        Ok(PortraitOutcome::GameNotFound) => {
            return Err(anyhow!("Game '{}' was not found on IGDB", request.game));
        }
        Err(err) => {
            error!("Portrait generation failed: {}", err);
            return Err(err.into());
        }
    };

    let namer = OutputNamer::new(
        &state.output_dir,
        &request.character,
        &request.game,
        cli.timestamp.then(Local::now),
    );
    for path in save_images(&namer, &images)? {
        println!("Saved {}", path.display());
    }
    Ok(())
}
