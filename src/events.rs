//! Donation change feed - announces donation writes to the aggregation worker.
//!
//! Every create, update, or delete of a donation record is published here as
//! a [`DonationChange`] carrying the before and after snapshots of the row.
//! The aggregation worker drains the feed and folds each change into the
//! owning campaign. Delivery is at-least-once in spirit: the worker treats
//! duplicates and reordering as survivable, and any change it fails to apply
//! is logged and dropped for the recompute sweep to repair later.

use crate::core::aggregator::{self, DonationSnapshot};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One donation write, as seen by the aggregation worker.
///
/// `before` is absent on create, `after` is absent on delete.
#[derive(Debug, Clone)]
pub struct DonationChange {
    /// Id of the donation row that was written
    pub donation_id: String,
    /// Row state before the write, if the row existed
    pub before: Option<DonationSnapshot>,
    /// Row state after the write, unless the row was deleted
    pub after: Option<DonationSnapshot>,
}

/// Publishing half of the donation change feed, shared by the intake helpers.
#[derive(Debug, Clone)]
pub struct DonationFeed {
    sender: mpsc::UnboundedSender<DonationChange>,
}

impl DonationFeed {
    /// Creates the feed and the receiving end the worker drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DonationChange>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Publishes one donation change.
    ///
    /// A closed feed (worker gone) is logged, not surfaced: the donation
    /// write itself already succeeded, and the sweep can rebuild aggregates.
    pub fn publish(&self, change: DonationChange) {
        if let Err(undelivered) = self.sender.send(change) {
            warn!(
                "aggregation worker is gone, dropping change for donation '{}'",
                undelivered.0.donation_id
            );
        }
    }
}

/// Drains the donation change feed and applies each change to its campaign.
///
/// Runs until every [`DonationFeed`] handle is dropped. A change that fails
/// to apply is logged and skipped so one bad event cannot stall the feed.
pub async fn run_aggregation_worker(
    db: DatabaseConnection,
    mut receiver: mpsc::UnboundedReceiver<DonationChange>,
) {
    info!("aggregation worker started");
    while let Some(change) = receiver.recv().await {
        if let Err(err) =
            aggregator::apply_donation_change(&db, change.before.as_ref(), change.after.as_ref())
                .await
        {
            error!(
                "failed to apply change for donation '{}': {err}",
                change.donation_id
            );
        }
    }
    info!("donation change feed closed, aggregation worker stopping");
}
