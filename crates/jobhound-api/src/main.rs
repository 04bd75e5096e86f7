//! JobHound server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jobhound_api::{build_router, AppState, CrawlService};
use jobhound_core::AppConfig;
use jobhound_db::Database;
use jobhound_scheduler::CrawlScheduler;
use jobhound_session::{SessionManager, SweepHandle};
use jobhound_sources::{SourceLoader, SourceRegistry};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobhound=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting JobHound");

    let config = AppConfig::load_with_env().context("Failed to load configuration")?;

    let loader = SourceLoader::with_default_dir().context("Failed to locate source definitions")?;
    let registry = Arc::new(
        SourceRegistry::load_from(&loader).context("Failed to load source definitions")?,
    );
    tracing::info!("Loaded {} source definitions", registry.count());

    let db_path = config.db_path().context("Failed to resolve database path")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    let db_path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let db = Arc::new(
        Database::open(db_path_str)
            .await
            .context("Failed to open database")?,
    );
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let sessions = Arc::new(
        SessionManager::new(config.session.clone(), &config.cache)
            .context("Failed to build session manager")?,
    );
    let sweep = SweepHandle::spawn(
        Arc::clone(&sessions),
        Duration::from_secs(config.session.sweep_interval_secs),
    );

    let crawl = Arc::new(CrawlService::new(
        config.clone(),
        Arc::clone(&sessions),
        registry,
        Arc::clone(&db),
    ));

    let scheduler = CrawlScheduler::spawn(config.scheduler.clone(), Arc::clone(&crawl) as _);

    let state = AppState {
        db,
        crawl,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind listen address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down");
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    sweep.shutdown().await;
    sessions.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {e}");
    }
}
