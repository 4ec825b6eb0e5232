use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use collectarr_cli::sync::{self, SyncContext};
use collectarr_config::{Config, MergeOutcome};
use collectarr_core::MediaKind;
use collectarr_plex::PlexServer;
use collectarr_providers::{ImdbList, RadarrClient, TmdbClient, TraktClient};

#[derive(Parser)]
#[command(
    name = "collectarr",
    about = "Sync Plex collections from TMDB, Trakt and IMDb lists"
)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(short, long, default_value = "config.yml", global = true)]
    config: std::path::PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update every configured collection.
    Run {
        /// Do not offer to send missing movies to Radarr.
        #[arg(long)]
        skip_radarr: bool,

        /// Only update the named collection.
        #[arg(long)]
        collection: Option<String>,
    },
    /// Merge a value into a collection method in the config file.
    Add {
        collection: String,
        method: String,
        value: String,
    },
    /// Authorize Trakt access with the device-code flow and store the token.
    TraktAuth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Run {
            skip_radarr,
            collection,
        } => run(&mut config, skip_radarr, collection.as_deref()).await,
        Command::Add {
            collection,
            method,
            value,
        } => add(&mut config, &collection, &method, &value),
        Command::TraktAuth => trakt_auth(&mut config).await,
    }
}

async fn run(config: &mut Config, skip_radarr: bool, only: Option<&str>) -> anyhow::Result<()> {
    let plex = PlexServer::new(&config.plex.url, &config.plex.token)
        .context("failed to build plex client")?;

    let movie_section = plex
        .find_section(&config.plex.movie_library, MediaKind::Movie)
        .await
        .context("movie library lookup failed")?;
    info!(library = %movie_section.title, key = %movie_section.key, "movie library found");

    let show_section = match &config.plex.show_library {
        Some(title) => match plex.find_section(title, MediaKind::Show).await {
            Ok(section) => Some(section),
            Err(err) => {
                warn!(library = %title, error = %err, "show library not found, continuing without it");
                None
            }
        },
        None => None,
    };

    let tmdb = config
        .tmdb
        .as_ref()
        .map(|c| TmdbClient::new(c.apikey.clone(), c.language.clone()));

    let trakt = match config.trakt.clone() {
        Some(section) => {
            let mut client =
                TraktClient::new(section.client_id, section.client_secret, section.authorization);
            match client.refresh_if_needed().await {
                Ok(Some(new_auth)) => {
                    config.set_trakt_authorization(&new_auth)?;
                    config
                        .save()
                        .context("failed to save refreshed trakt authorization")?;
                    info!("refreshed trakt authorization saved to config");
                    Some(client)
                }
                Ok(None) => Some(client),
                Err(err) => {
                    warn!(error = %err, "trakt unavailable; run `collectarr trakt-auth`");
                    None
                }
            }
        }
        None => None,
    };

    let radarr = config.radarr.as_ref().map(RadarrClient::new);

    let ctx = SyncContext {
        plex,
        movie_section,
        show_section,
        tmdb,
        trakt,
        radarr,
        imdb: ImdbList::new(),
        image_server: config.image_server.clone(),
        http: reqwest::Client::new(),
        skip_radarr,
    };

    sync::run(&ctx, config, only).await
}

fn add(config: &mut Config, collection: &str, method: &str, value: &str) -> anyhow::Result<()> {
    match config.merge_collection_value(collection, method, value)? {
        MergeOutcome::AlreadyPresent => {
            info!(collection, method, value, "value already in collection config");
        }
        outcome => {
            config.save().context("failed to write config")?;
            info!(collection, method, value, ?outcome, "config updated");
        }
    }
    Ok(())
}

async fn trakt_auth(config: &mut Config) -> anyhow::Result<()> {
    let section = config
        .trakt
        .clone()
        .context("`trakt` section missing from config")?;

    let mut client = TraktClient::new(
        section.client_id,
        section.client_secret,
        section.authorization,
    );
    let auth = client
        .authenticate_device()
        .await
        .context("trakt device authorization failed")?;

    config.set_trakt_authorization(&auth)?;
    config.save().context("failed to save trakt authorization")?;
    info!("trakt authorization stored in config");
    Ok(())
}
