//! # Moviedex
//!
//! Command-line front end and REST server for the movie catalog.
//!
//! Without a subcommand the binary serves the REST API. Subcommands run a
//! single catalog operation against the configured database and print the
//! result to stdout; logs go to stderr.

use std::{num::NonZeroUsize, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use moviedex_core::{
    backfill::PosterBackfill,
    database::SqliteCatalog,
    providers::OmdbProvider,
    types::{ImdbId, ListQuery, NewMovie, PosterUrl},
};
use moviedex_server::{
    AppState, cli,
    handlers::posters::DEFAULT_BACKFILL_LIMIT,
    infra::config::Config,
    routes,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "moviedex")]
#[command(about = "Movie catalog with OMDb poster backfill")]
struct Cli {
    /// SQLite database URL (overrides config)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a movie to the catalog
    Add(AddArgs),
    /// List movie titles
    List(ListArgs),
    /// Show one movie
    Details(IdArgs),
    /// Delete one movie
    Delete(IdArgs),
    /// Set the poster URL of one movie
    UpdatePoster(UpdatePosterArgs),
    /// Look up posters for movies that have none
    FetchPosters(FetchPostersArgs),
    /// Serve the REST API (default)
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
    /// The IMDb ID of a movie or series
    #[arg(long = "imdbid")]
    imdb_id: String,
    /// The movie's or series' title
    #[arg(long)]
    title: String,
    /// The movie's or series' year of release
    #[arg(long)]
    year: i32,
    /// The movie's or series' rating on IMDb
    #[arg(long)]
    rating: f64,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Sort movies by 'year' or 'rating'
    #[arg(long)]
    sort: Option<String>,
    /// Order 'asc' or 'desc'
    #[arg(long)]
    order: Option<String>,
    /// Filter movies by year
    #[arg(long)]
    year: Option<i32>,
}

#[derive(ClapArgs, Debug)]
struct IdArgs {
    /// The IMDb ID of a movie or series
    #[arg(long = "imdbid")]
    imdb_id: String,
}

#[derive(ClapArgs, Debug)]
struct UpdatePosterArgs {
    /// The IMDb ID of a movie or series
    #[arg(long = "imdbid")]
    imdb_id: String,
    /// Poster URL to store
    #[arg(long)]
    url: String,
}

#[derive(ClapArgs, Debug)]
struct FetchPostersArgs {
    /// Maximum number of movies to process
    #[arg(long, default_value_t = DEFAULT_BACKFILL_LIMIT)]
    limit: u32,
    /// Concurrent lookups (overrides config)
    #[arg(long, env = "MOVIEDEX_POSTER_WORKERS")]
    workers: Option<NonZeroUsize>,
}

#[derive(ClapArgs, Debug, Default)]
struct ServeArgs {
    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::from_env().context("invalid configuration")?;
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,moviedex_core=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    let catalog = SqliteCatalog::connect(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("failed to open catalog at {}", config.database_url))?;
    catalog
        .migrate()
        .await
        .context("catalog migration failed")?;

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let result = run_command(
        cli.command.unwrap_or(Command::Serve(ServeArgs::default())),
        config,
        &catalog,
        shutdown,
    )
    .await;

    catalog.close().await;
    result
}

async fn run_command(
    command: Command,
    mut config: Config,
    catalog: &SqliteCatalog,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let output = match command {
        Command::Add(args) => {
            let movie = NewMovie {
                imdb_id: ImdbId::parse(&args.imdb_id)?,
                title: args.title,
                year: args.year,
                rating: args.rating,
            };
            movie.validate()?;
            cli::add_movie(catalog, movie).await?
        }
        Command::List(args) => {
            let query = ListQuery::from_parts(
                args.sort.as_deref(),
                args.order.as_deref(),
                args.year,
            );
            cli::list_titles(catalog, &query).await?
        }
        Command::Details(args) => {
            cli::movie_details(catalog, &ImdbId::parse(&args.imdb_id)?).await?
        }
        Command::Delete(args) => {
            cli::delete_movie(catalog, &ImdbId::parse(&args.imdb_id)?).await?
        }
        Command::UpdatePoster(args) => {
            let imdb_id = ImdbId::parse(&args.imdb_id)?;
            let poster = PosterUrl::parse(args.url)?;
            cli::update_poster(catalog, &imdb_id, &poster).await?
        }
        Command::FetchPosters(args) => {
            if let Some(workers) = args.workers {
                config.poster_workers = workers;
            }
            let backfill = build_backfill(&config, catalog)?;
            cli::fetch_posters(&backfill, args.limit, shutdown).await?
        }
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server_host = host;
            }
            if let Some(port) = args.port {
                config.server_port = port;
            }
            return run_server(config, catalog, shutdown).await;
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn build_backfill(
    config: &Config,
    catalog: &SqliteCatalog,
) -> anyhow::Result<PosterBackfill> {
    let lookup = OmdbProvider::new(config.omdb.settings()?)
        .context("failed to build OMDb client")?;
    Ok(PosterBackfill::new(
        Arc::new(catalog.clone()),
        Arc::new(lookup),
        config.pipeline(),
    ))
}

async fn run_server(
    config: Config,
    catalog: &SqliteCatalog,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let backfill = match build_backfill(&config, catalog) {
        Ok(backfill) => Some(Arc::new(backfill)),
        Err(err) => {
            warn!(error = %err, "poster backfill endpoint disabled");
            None
        }
    };

    let state = AppState::new(Arc::new(catalog.clone()), backfill)
        .with_shutdown(shutdown.clone());
    let app = routes::create_app(state);

    let listener =
        tokio::net::TcpListener::bind((config.server_host.as_str(), config.server_port))
            .await
            .with_context(|| {
                format!(
                    "failed to bind {}:{}",
                    config.server_host, config.server_port
                )
            })?;
    info!(
        address = %listener.local_addr()?,
        workers = config.poster_workers.get(),
        "Starting Moviedex server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")?;

    info!("Moviedex server stopped");
    Ok(())
}

fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                shutdown.cancel();
            }
            Err(err) => warn!(error = %err, "failed to listen for shutdown signal"),
        }
    });
}
