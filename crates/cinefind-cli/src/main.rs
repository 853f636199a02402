//! cinefind - movie discovery CLI.

/// Search-count backend selection.
mod backend;
/// Application configuration (TOML).
mod config;
/// Terminal UI components.
mod tui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::backend::Backend;
use crate::config::{AppConfig, ResolvedConfig, resolve_config_path};
use crate::tui::run_search_screen;
use cinefind_api::store::SearchCountDocument;
use cinefind_api::tmdb::{Movie, MovieApi, MovieDetails, MovieListParams, TmdbClient};
use cinefind_core::fetch::{Completion, FetchContainer};
use cinefind_core::tracker::PopularityTracker;
use cinefind_core::view::{
    DetailView, EmptyState, FeedStatus, HomeFeed, MovieCard, SearchBody, error_text,
    trending_cards,
};

/// User agent sent to both APIs.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show popular movies and trending searches.
    Home,
    /// Search movies once and record the search.
    Search(SearchArgs),
    /// Show details for one movie.
    Details(DetailsArgs),
    /// List the most searched terms.
    Trending(TrendingArgs),
    /// Search interactively via TUI.
    Browse,
    /// Manage the config file.
    Config(ConfigCommand),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query.
    #[arg(long)]
    query: String,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// TMDB movie ID.
    #[arg(long)]
    id: u64,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Number of terms to show (default: `search.trending_limit`).
    #[arg(long)]
    limit: Option<u32>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a config template.
    Init(ConfigInitArgs),
    /// Print the effective config with secrets masked.
    Show,
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct ConfigInitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

/// Clients and settings shared by the data commands.
struct App {
    tmdb: Arc<TmdbClient>,
    tracker: Arc<PopularityTracker<Backend>>,
    debounce: Duration,
    trending_limit: u32,
}

impl App {
    /// Loads and resolves the config, then builds the clients.
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is missing or a client cannot be built.
    fn load(config_path: &Path, dir: Option<&PathBuf>) -> Result<Self> {
        let config = AppConfig::load(config_path)?
            .with_env(|name| std::env::var(name).ok())
            .resolve()
            .with_context(|| format!("invalid configuration ({})", config_path.display()))?;

        let backend = Backend::open(&config.store, dir, USER_AGENT)?;
        tracing::debug!(?backend, "opened search-count backend");

        Ok(Self {
            tmdb: Arc::new(build_tmdb_client(&config)?),
            tracker: Arc::new(PopularityTracker::new(backend)),
            debounce: config.debounce,
            trending_limit: config.trending_limit,
        })
    }

    /// Container listing movies for `params`.
    fn movie_list(&self, params: MovieListParams) -> FetchContainer<Vec<Movie>> {
        let api = Arc::clone(&self.tmdb);
        FetchContainer::new(
            move || {
                let api = Arc::clone(&api);
                let params = params.clone();
                async move {
                    api.search_or_list_movies(&params)
                        .await
                        .map(|response| response.results)
                }
            },
            false,
        )
    }

    /// Container for the top `limit` trending documents.
    fn trending(&self, limit: u32) -> FetchContainer<Vec<SearchCountDocument>> {
        let tracker = Arc::clone(&self.tracker);
        FetchContainer::new(
            move || {
                let tracker = Arc::clone(&tracker);
                async move { tracker.get_trending(limit).await }
            },
            false,
        )
    }

    /// Container for one movie's details.
    fn details(&self, movie_id: u64) -> FetchContainer<MovieDetails> {
        let api = Arc::clone(&self.tmdb);
        FetchContainer::new(
            move || {
                let api = Arc::clone(&api);
                async move { api.movie_details(movie_id).await }
            },
            false,
        )
    }
}

/// Builds the TMDB client from resolved settings.
///
/// # Errors
///
/// Returns an error if the client fails to build.
fn build_tmdb_client(config: &ResolvedConfig) -> Result<TmdbClient> {
    let mut builder = TmdbClient::builder()
        .api_token(&config.tmdb_api_token)
        .user_agent(USER_AGENT);
    if let Some(url) = &config.tmdb_base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(language) = &config.tmdb_language {
        builder = builder.language(language);
    }
    if let Some(append) = &config.tmdb_append_to_response {
        builder = builder.append_to_response(append);
    }
    builder.build().context("failed to build TMDB client")
}

/// Logs a movie listing as a table.
fn log_movie_cards(cards: &[MovieCard]) {
    tracing::info!("ID\tYear\tLang\tRating\tTitle");
    for card in cards {
        tracing::info!(
            "{}\t{}\t{}\t{}/5\t{}{}",
            card.id,
            card.year,
            card.language,
            card.stars,
            card.title,
            if card.hot { " (hot)" } else { "" },
        );
    }
}

/// Logs an empty-state placeholder.
fn log_empty_state(empty: &EmptyState) {
    tracing::info!("{}", empty.title());
    tracing::info!("{}", empty.message());
    tracing::info!("{}", empty.hint());
}

/// Runs the `home` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or a client fails to build.
/// Fetch errors are logged, not returned.
#[instrument(skip_all)]
async fn run_home(config_path: &Path, dir: Option<&PathBuf>) -> Result<()> {
    let app = App::load(config_path, dir)?;
    let trending = app.trending(app.trending_limit);
    let popular = app.movie_list(MovieListParams::popular());
    tokio::join!(trending.refetch(), popular.refetch());

    let feed = HomeFeed {
        trending: trending.snapshot(),
        popular: popular.snapshot(),
    };
    match feed.status() {
        FeedStatus::Loading => tracing::info!("Loading..."),
        FeedStatus::Error(text) => tracing::error!("{text}"),
        FeedStatus::Ready => {
            let trending = feed.trending_cards();
            if !trending.is_empty() {
                tracing::info!("Trending Movies");
                for card in &trending {
                    tracing::info!("{}. {} ({})", card.rank, card.title, card.search_term);
                }
            }
            tracing::info!("All Movies");
            log_movie_cards(&feed.popular_cards());
        }
    }

    Ok(())
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or a client fails to build.
/// Fetch errors are logged, not returned.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, config_path: &Path, dir: Option<&PathBuf>) -> Result<()> {
    let app = App::load(config_path, dir)?;
    if args.query.trim().is_empty() {
        log_empty_state(&EmptyState::Prompt);
        return Ok(());
    }

    let results = app.movie_list(MovieListParams::new(&args.query));
    if let Completion::Succeeded(movies) = results.refetch().await
        && let Some(top) = movies.first()
    {
        let outcome = app.tracker.record_search(&args.query, top).await;
        tracing::debug!(?outcome, "search recorded");
    }

    match SearchBody::from_state(&args.query, &results.snapshot()) {
        SearchBody::Loading => tracing::info!("Loading..."),
        SearchBody::Error(text) => tracing::error!("{text}"),
        SearchBody::Results { heading, cards } => {
            if let Some(heading) = heading {
                tracing::info!("{heading}");
            }
            log_movie_cards(&cards);
        }
        SearchBody::Empty(empty) => log_empty_state(&empty),
    }

    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or a client fails to build.
/// Fetch errors are logged, not returned.
#[instrument(skip_all)]
async fn run_details(args: &DetailsArgs, config_path: &Path, dir: Option<&PathBuf>) -> Result<()> {
    let app = App::load(config_path, dir)?;
    let view = match app.details(args.id).refetch().await {
        Completion::Succeeded(details) => DetailView::from_details(&details),
        Completion::Failed(err) => {
            tracing::error!("{}", error_text(&err));
            return Ok(());
        }
        Completion::Stale => return Ok(()),
    };

    tracing::info!("Title: {}", view.title);
    if let Some(tagline) = &view.tagline {
        tracing::info!("Tagline: {tagline}");
    }
    tracing::info!("Released: {}", view.year);
    tracing::info!("Runtime: {}", view.runtime);
    tracing::info!("Rating: {} ({} votes)", view.rating, view.vote_count);
    tracing::info!("Genres: {}", view.genres.join(", "));
    if let Some(director) = &view.director {
        tracing::info!("Director: {director}");
    }
    for member in &view.cast {
        tracing::info!("Cast: {member}");
    }
    tracing::info!("Budget: {}", view.budget);
    tracing::info!("Revenue: {}", view.revenue);
    tracing::info!("Production: {}", view.production);
    tracing::info!("Languages: {}", view.languages);
    tracing::info!("Poster: {}", view.poster_url);
    if let Some(trailer) = &view.trailer_url {
        tracing::info!("Trailer: {trailer}");
    }
    tracing::info!("Overview: {}", view.overview);

    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or a client fails to build.
/// Store errors are logged, not returned.
#[instrument(skip_all)]
async fn run_trending(
    args: &TrendingArgs,
    config_path: &Path,
    dir: Option<&PathBuf>,
) -> Result<()> {
    let app = App::load(config_path, dir)?;
    let limit = args.limit.unwrap_or(app.trending_limit);
    let documents = match app.trending(limit).refetch().await {
        Completion::Succeeded(documents) => documents,
        Completion::Failed(err) => {
            tracing::error!("{}", error_text(&err));
            return Ok(());
        }
        Completion::Stale => return Ok(()),
    };

    if documents.is_empty() {
        tracing::info!("No searches recorded yet");
        return Ok(());
    }
    tracing::info!("Rank\tCount\tTerm\tMovie");
    for card in trending_cards(&documents) {
        tracing::info!(
            "{}\t{}\t{}\t{} ({})",
            card.rank,
            card.count,
            card.search_term,
            card.title,
            card.movie_id
        );
    }

    Ok(())
}

/// Runs the `browse` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or the terminal UI fails.
#[instrument(skip_all)]
async fn run_browse(config_path: &Path, dir: Option<&PathBuf>) -> Result<()> {
    let app = App::load(config_path, dir)?;
    let trending = match app.tracker.get_trending(app.trending_limit).await {
        Ok(documents) => trending_cards(&documents),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load trending searches");
            Vec::new()
        }
    };

    run_search_screen(
        Arc::clone(&app.tmdb),
        Arc::clone(&app.tracker),
        app.debounce,
        trending,
    )
    .await
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists without `--force` or cannot be written.
fn run_config_init(config_path: &Path, args: &ConfigInitArgs) -> Result<()> {
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    AppConfig::template().save(config_path)?;
    tracing::info!("Wrote config template to {}", config_path.display());
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or serialized.
fn run_config_show(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?.with_env(|name| std::env::var(name).ok());
    let content =
        toml::to_string_pretty(&config.masked()).context("failed to serialize config to TOML")?;

    tracing::info!("Config file: {}", config_path.display());
    for line in content.lines() {
        tracing::info!("{line}");
    }
    if let Err(err) = config.resolve() {
        tracing::warn!("{err:#}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    let config_path = resolve_config_path(dir)?;
    match cli.command {
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init(args) => run_config_init(&config_path, &args),
            ConfigSubcommands::Show => run_config_show(&config_path),
        },
        Commands::Home => run_home(&config_path, dir).await,
        Commands::Search(args) => run_search(&args, &config_path, dir).await,
        Commands::Details(args) => run_details(&args, &config_path, dir).await,
        Commands::Trending(args) => run_trending(&args, &config_path, dir).await,
        Commands::Browse => run_browse(&config_path, dir).await,
    }
}
