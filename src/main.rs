//! Repofolio - cached JSON facade over a GitHub user's public repositories
//!
//! Serves `GET /api/projects`, answering from an in-memory snapshot and
//! refreshing it from the GitHub GraphQL API once its TTL has passed.

use std::sync::Arc;

use clap::Parser;

use repofolio::cache::ProjectCache;
use repofolio::cli::Cli;
use repofolio::data::GithubClient;
use repofolio::{observability, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the environment may already be set
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    if config.github_token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set; upstream requests will be unauthenticated");
    }

    let source = Arc::new(GithubClient::from_config(&config));
    let cache = Arc::new(ProjectCache::new(source, config.cache_ttl));
    tracing::info!(
        ttl_secs = cache.ttl().num_seconds(),
        origins = config.allowed_origins.len(),
        "starting repofolio"
    );
    let app = server::build_app(cache, &config);

    server::serve(config.bind, app).await?;

    Ok(())
}
