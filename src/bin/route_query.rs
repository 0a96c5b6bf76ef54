//! Route queries through the semantic intent router
//!
//! Usage:
//!   cargo run --features local-model --bin route_query                  # Demo queries
//!   cargo run --features local-model --bin route_query -- "See you soon!"
//!   cargo run --bin route_query -- --config my_routes.yaml --json "Hi"
//!   cargo run --bin route_query -- --explain --threshold 0.4 "Will it rain?"

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use intent_router::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use intent_router::{Router, RouterConfig};

/// Queries routed when none are given on the command line
const DEMO_QUERIES: [&str; 4] = [
    "Hey, how are you?",
    "See you soon!",
    "Will it be sunny tomorrow?",
    "What's the meaning of life?",
];

#[derive(Parser)]
#[command(name = "route_query")]
#[command(about = "Classify queries into configured intents by embedding similarity")]
struct Args {
    /// Router configuration (YAML)
    #[arg(short = 'c', long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured distance threshold
    #[arg(short = 't', long)]
    threshold: Option<f32>,

    /// Show the minimum distance for every intent, not just the winner
    #[arg(short = 'e', long)]
    explain: bool,

    /// One JSON object per query instead of text
    #[arg(long)]
    json: bool,

    /// Queries to route (defaults to a few demo queries)
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = RouterConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let registry = config.registry().context("Invalid intent catalogue")?;
    let embedder = config
        .embedder
        .connect()
        .context("Failed to initialise embedder")?;

    let router = Router::build_new(registry, embedder, config.settings())
        .await
        .context("Failed to build embedding cache")?;
    info!(intents = router.registry().len(), "router ready");

    let threshold = args.threshold.unwrap_or(config.threshold);
    let queries: Vec<String> = if args.queries.is_empty() {
        DEMO_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        args.queries
    };

    for query in &queries {
        let scores = router
            .scores(query)
            .await
            .with_context(|| format!("Failed to route {:?}", query))?;
        let result = Router::rank_scores(scores.clone(), threshold)?
            .into_iter()
            .next();

        if args.json {
            let scores = args.explain.then_some(&scores);
            println!(
                "{}",
                serde_json::json!({
                    "query": query,
                    "match": result,
                    "scores": scores,
                })
            );
            continue;
        }

        println!("{} '{}'", "Query:".cyan().bold(), query);
        match &result {
            Some(m) => println!(
                "{} {}, Priority: {}, Min Distance: {:.4}",
                "Matched Route:".green(),
                m.name,
                m.priority,
                m.min_distance
            ),
            None => println!("{}", "No matching route found.".yellow()),
        }

        if args.explain {
            for score in &scores {
                let marker = if score.min_distance < threshold { "✓" } else { " " };
                println!(
                    "  {} {:<12} p={:<3} d={:.4}  ~ {:?}",
                    marker, score.name, score.priority, score.min_distance, score.nearest_example
                );
            }
        }
        println!();
    }

    Ok(())
}
