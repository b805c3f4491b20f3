//! `CampaignLedger` entry point.
//!
//! Wires storage, the aggregation worker, the lifecycle scheduler, and the
//! HTTP API together and serves until the process is stopped.

use campaign_ledger::{
    api::{self, ApiState},
    config::{database, settings::Settings},
    errors::Result,
    events::{self, DonationFeed},
    scheduler,
};
use dotenvy::dotenv;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Resolve settings from config.toml and the environment
    let settings = Settings::load().inspect_err(|e| error!("Failed to load settings: {e}"))?;
    if settings.admin_token.is_none() {
        warn!("No admin token configured; operator endpoints are disabled.");
    }

    // 4. Initialize database and schema
    let db = database::init_db(&settings.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Start the aggregation worker on the donation change feed
    let (donation_feed, change_receiver) = DonationFeed::channel();
    tokio::spawn(events::run_aggregation_worker(db.clone(), change_receiver));

    // 6. Start the lifecycle scheduler
    tokio::spawn(scheduler::run_lifecycle_scheduler(
        db.clone(),
        Duration::from_secs(settings.lifecycle_interval_secs),
    ));

    // 7. Serve the HTTP API
    let app = api::router(ApiState {
        db,
        donation_feed,
        admin_token: settings.admin_token,
    });
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("API listening on http://{}", settings.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
