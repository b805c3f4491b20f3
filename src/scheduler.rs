//! Lifecycle scheduler - periodically closes campaigns past their end time.

use crate::core::lifecycle;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Runs the lifecycle pass forever on a fixed period.
///
/// The first pass runs immediately on startup, then once per period. A
/// failed pass is logged and the loop keeps going; there is no caller to
/// report to and the next tick retries naturally.
pub async fn run_lifecycle_scheduler(db: DatabaseConnection, period: Duration) {
    info!("lifecycle scheduler started (period: {period:?})");
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match lifecycle::close_expired_campaigns(&db).await {
            Ok(0) => {}
            Ok(closed) => info!("closed {closed} expired campaign(s)"),
            Err(err) => error!("lifecycle pass failed: {err}"),
        }
    }
}
