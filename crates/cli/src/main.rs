use anyhow::{Context, Result};
use catalog::CatalogStore;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use server::{
    EngineConfig, FilterParams, RecommendEngine, RecommendRequest, RecommendResponse,
    SearchRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// movie-match - swipe-style movie recommendations and hybrid search
#[derive(Parser)]
#[command(name = "movie-match")]
#[command(about = "Movie recommendation and search engine", long_about = None)]
struct Cli {
    /// Directory containing movies.jsonl and embeddings.bin
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Address of the sentence-encoder gRPC service
    #[arg(long, default_value = "http://127.0.0.1:50051")]
    encoder_addr: String,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by recommend and search
#[derive(Args, Clone)]
struct FilterArgs {
    /// Genre substring filter (case-insensitive)
    #[arg(long)]
    genre: Option<String>,

    /// Original-language code filter (exact, e.g. "en")
    #[arg(long)]
    language: Option<String>,

    /// Earliest release year (inclusive)
    #[arg(long)]
    year_start: Option<i32>,

    /// Latest release year (inclusive)
    #[arg(long)]
    year_end: Option<i32>,

    /// Filter on the adult flag
    #[arg(long)]
    adult: Option<bool>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            genre: args.genre,
            language: args.language,
            year_start: args.year_start,
            year_end: args.year_end,
            adult: args.adult,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get the next recommendation for a swipe state
    Recommend {
        /// Movie ids already swiped, comma-separated
        #[arg(long, value_delimiter = ',')]
        seen: Vec<u32>,

        /// Movie ids swiped right, comma-separated
        #[arg(long, value_delimiter = ',')]
        liked: Vec<u32>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the raw JSON response instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog by keyword and meaning
    Search {
        /// Free-text query
        query: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the raw JSON response instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Report catalog readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading catalog from {}...", cli.data_dir.display());
    let start = Instant::now();
    let catalog = Arc::new(
        CatalogStore::load(&cli.data_dir).context("Failed to load the movie catalog")?,
    );
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        catalog.len(),
        start.elapsed()
    );

    let config = EngineConfig {
        encoder_addr: cli.encoder_addr,
        ..Default::default()
    };
    let engine = RecommendEngine::new(catalog, config);

    match cli.command {
        Commands::Recommend {
            seen,
            liked,
            filters,
            json,
        } => handle_recommend(&engine, seen, liked, filters, json).await?,
        Commands::Search {
            query,
            filters,
            json,
        } => handle_search(&engine, query, filters, json).await?,
        Commands::Health => handle_health(&engine)?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    engine: &RecommendEngine,
    seen: Vec<u32>,
    liked: Vec<u32>,
    filters: FilterArgs,
    json: bool,
) -> Result<()> {
    let response = engine
        .recommend(RecommendRequest {
            seen_ids: seen,
            liked_ids: liked,
            filters: filters.into(),
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        RecommendResponse::Match {
            movie,
            taste_vector,
        } => {
            println!("{}", "Next card:".bold().blue());
            println!(
                "{} {} [{}] ({})",
                movie.movie_id.to_string().green(),
                movie.title,
                movie.genres,
                movie.release_date
            );
            if !movie.overview.is_empty() {
                println!("  {}", movie.overview);
            }
            if let Some(url) = &movie.poster_url {
                println!("  poster: {}", url);
            }
            let tier = if taste_vector.is_some() {
                "similarity"
            } else {
                "popularity"
            };
            println!("  picked by the {} tier", tier.cyan());
        }
        RecommendResponse::NoMatch { error } => {
            println!("{}", error.red());
        }
    }
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(
    engine: &RecommendEngine,
    query: String,
    filters: FilterArgs,
    json: bool,
) -> Result<()> {
    let response = engine
        .search(SearchRequest {
            query: query.clone(),
            filters: filters.into(),
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Search results for '{}':", query).bold().blue()
    );
    if response.movies.is_empty() {
        println!("  no matches");
    }
    for movie in &response.movies {
        println!(
            "{}: {} [{}] ({})",
            movie.movie_id.to_string().green(),
            movie.title,
            movie.genres,
            movie.release_date
        );
    }
    println!("took {:.1} ms", response.took_ms);
    Ok(())
}

/// Handle the 'health' command
fn handle_health(engine: &RecommendEngine) -> Result<()> {
    let health = engine.health();
    println!(
        "{} status={} movies={} embeddings={}x{}",
        "✓".green(),
        health.status,
        health.movies_loaded,
        health.embeddings_shape[0],
        health.embeddings_shape[1]
    );
    Ok(())
}
