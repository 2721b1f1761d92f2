//! osu! API command line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use osu_api::api::types::{NamedId, Progress};
use osu_api::{Client, Credentials, DispatcherOptions, Gamemode, RankingOptions, RankingType, ScoreType};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// OAuth client id, overrides the configuration
    #[arg(long)]
    client_id: Option<String>,

    /// OAuth client secret, overrides the configuration
    #[arg(long)]
    client_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a user by id or username
    User {
        user: String,
        #[arg(short, long)]
        mode: Option<Gamemode>,
    },
    /// Show a beatmap
    Beatmap { id: u64 },
    /// Show a beatmapset and its difficulties
    Beatmapset { id: u64 },
    /// List a user's scores
    Scores {
        user: u64,
        kind: ScoreType,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List recent multiplayer matches
    Matches {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show a ranking table
    Rankings {
        mode: Gamemode,
        kind: RankingType,
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Two letter country code
        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let mut log_config = LogConfig::from_config(&config.logging, "osu-api")?;
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    if let Some(client_id) = args.client_id {
        config.credentials.client_id = client_id;
    }
    if let Some(client_secret) = args.client_secret {
        config.credentials.client_secret = client_secret;
    }

    let credentials = Credentials::from_config(&config).context("Missing API credentials")?;
    let client = Client::new(credentials, DispatcherOptions::from_config(&config))
        .context("Failed to create API client")?;
    client.connect().await.context("Failed to obtain an access token")?;

    let result = run(&client, args.command).await;
    client.close();
    result
}

async fn run(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::User { user, mode } => {
            let user = match user.parse::<u64>() {
                Ok(id) => client.get_user(id, mode).await,
                Err(_) => client.get_user_by_name(&user, mode).await,
            }
            .context("Failed to fetch user")?;
            println!("{}", serde_json::to_string_pretty(user.raw())?);
        }
        Command::Beatmap { id } => {
            let beatmap = client.get_beatmap(id).await.context("Failed to fetch beatmap")?;
            println!("{}", serde_json::to_string_pretty(beatmap.raw())?);
        }
        Command::Beatmapset { id } => {
            let set = client
                .get_beatmapset(id)
                .await
                .context("Failed to fetch beatmapset")?;
            println!("{} - {} ({}, {})", set.artist, set.title, set.creator, set.status);
            if let Some(full) = set.extended() {
                let name = |field: &Option<NamedId>| {
                    field.as_ref().map(|n| n.name.clone()).unwrap_or_else(|| "-".into())
                };
                let progress = |field: &Option<Progress>| {
                    field
                        .map(|p| format!("{}/{}", p.current, p.required))
                        .unwrap_or_else(|| "-".into())
                };
                println!(
                    "  genre: {}, language: {}, hype: {}, nominations: {}{}",
                    name(&full.genre),
                    name(&full.language),
                    progress(&full.hype),
                    progress(&full.nominations),
                    if full.availability.download_disabled { ", download disabled" } else { "" }
                );
            }
            for beatmap in set.beatmaps.iter().flatten() {
                println!(
                    "  [{}] {} {:.2}* {}s",
                    beatmap.id, beatmap.version, beatmap.star_rating, beatmap.length
                );
            }
        }
        Command::Scores { user, kind, limit } => {
            let mut cursor = client.get_user_scores(user, kind, None);
            let mut scores = cursor.iterate(limit.min(100)).take(limit);
            while let Some(score) = scores.next().await {
                let score = score.context("Failed to fetch scores")?;
                println!(
                    "{} {} {:>8} {:.2}% {}pp [{}]",
                    score.created_at.format("%Y-%m-%d"),
                    score.rank,
                    score.score,
                    score.accuracy * 100.0,
                    score.pp.map(|pp| format!("{:.0}", pp)).unwrap_or_else(|| "-".into()),
                    score.mods.join(",")
                );
            }
        }
        Command::Matches { limit } => {
            let mut cursor = client.get_matches();
            let mut matches = cursor.iterate(limit.min(100)).take(limit);
            while let Some(game) = matches.next().await {
                let game = game.context("Failed to fetch matches")?;
                let state = if game.end_time.is_some() { "closed" } else { "open" };
                println!("{} {} [{}] {}", game.id, game.start_time, state, game.name);
            }
        }
        Command::Rankings {
            mode,
            kind,
            limit,
            country,
        } => {
            let options = RankingOptions {
                country,
                ..Default::default()
            };
            let mut cursor = client.get_rankings(mode, kind, options);
            {
                let mut entries = cursor.stream().take(limit).enumerate();
                while let Some((position, entry)) = entries.next().await {
                    let entry = entry.context("Failed to fetch rankings")?;
                    let name = entry
                        .user
                        .as_ref()
                        .map(|user| user.username.as_str())
                        .unwrap_or("?");
                    println!("{:>4} {:<20} {:>10.2}pp", position + 1, name, entry.pp);
                }
            }
            if let Some(info) = cursor.spotlight_info() {
                println!(
                    "Spotlight: {} ({} beatmapsets)",
                    info.spotlight.name,
                    info.beatmapsets.len()
                );
            }
        }
    }
    Ok(())
}
