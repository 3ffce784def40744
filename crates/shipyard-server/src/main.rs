//! Shipyard server entry point.

use shipyard_api::{StaticIdentity, TrackerConfig, TrackerService};
use shipyard_db::repository::{SurrealIdeaRepository, SurrealResourceRepository};
use shipyard_db::{DbConfig, DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shipyard=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting Shipyard server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Shipyard server failed");
        std::process::exit(1);
    }

    tracing::info!("Shipyard server stopped.");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let manager = DbManager::connect(&DbConfig::from_env()).await?;
    let db = manager.client().clone();
    run_migrations(&db).await?;

    let service = TrackerService::new(
        SurrealIdeaRepository::new(db.clone()),
        SurrealResourceRepository::new(db),
        StaticIdentity::anonymous(),
        TrackerConfig::default(),
    );

    let builders = service.get_top_builders(None).await?;
    for builder in &builders {
        tracing::info!(
            rank = builder.rank.unwrap_or_default(),
            builder = %builder.builder_name,
            completed_projects = builder.completed_projects,
            total_views = builder.total_views,
            "Top builder"
        );
    }
    tracing::info!(count = builders.len(), "Leaderboard loaded");

    Ok(())
}
