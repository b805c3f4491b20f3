//! Recompute sweep - rebuilds every campaign aggregate from the donation table.
//!
//! The incremental paths are allowed to drift: events get dropped, duplicates
//! get applied, recent-donor removals miss. This sweep is the repair path. It
//! reads every confirmed donation, recomputes totals per campaign, and writes
//! every campaign row in one transaction. Running it twice over unchanged
//! donations produces identical aggregates.

use crate::{
    core::aggregator::ANONYMOUS_DONOR,
    core::retry_on_conflict,
    entities::{
        Campaign, CampaignStatus, Donation, DonationStatus, DonorEntry, LastDonors, campaign,
        donation,
    },
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Entries the sweep keeps in each campaign's recent-donor list
pub const SWEEP_LAST_DONORS: usize = 10;

/// Recomputed totals for one campaign, as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTotals {
    /// Sum of confirmed donation amounts
    pub total_donated: f64,
    /// Count of confirmed donations
    pub donors_count: i32,
}

/// Rebuilds the aggregates of every campaign from confirmed donations.
///
/// Campaigns with no confirmed donations are reset to zeros; confirmed
/// donations referencing a campaign id with no row get a draft placeholder
/// row so their money is never silently unaccounted. `status`, `end_at`,
/// `title`, and `goal` are left untouched. Returns the totals written, keyed
/// by campaign id.
///
/// # Errors
/// Returns an error when the transaction fails for a non-transient reason.
pub async fn recompute_all(db: &DatabaseConnection) -> Result<BTreeMap<String, CampaignTotals>> {
    retry_on_conflict(|| recompute_once(db)).await
}

async fn recompute_once(db: &DatabaseConnection) -> Result<BTreeMap<String, CampaignTotals>> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let confirmed = Donation::find()
        .filter(donation::Column::Status.eq(DonationStatus::Confirmed))
        .all(&txn)
        .await?;

    let mut groups: HashMap<String, Vec<donation::Model>> = HashMap::new();
    for row in confirmed {
        let Some(campaign_id) = row.campaign_id.clone().filter(|id| !id.is_empty()) else {
            continue;
        };
        groups.entry(campaign_id).or_default().push(row);
    }

    let mut results = BTreeMap::new();

    for existing in Campaign::find().all(&txn).await? {
        let computed = groups
            .remove(&existing.id)
            .map_or_else(aggregates_of_nothing, aggregates_of);
        results.insert(existing.id.clone(), computed.totals());

        let mut active: campaign::ActiveModel = existing.into();
        active.total_donated = Set(computed.total_donated);
        active.donors_count = Set(computed.donors_count);
        active.last_donors = Set(computed.last_donors);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    // Confirmed donations whose campaign row was never created, typically
    // because campaign management runs in a separate flow.
    for (campaign_id, rows) in groups {
        let computed = aggregates_of(rows);
        info!("recompute creating missing campaign '{campaign_id}'");
        results.insert(campaign_id.clone(), computed.totals());
        campaign::ActiveModel {
            id: Set(campaign_id),
            title: Set(None),
            goal: Set(None),
            status: Set(CampaignStatus::Draft),
            total_donated: Set(computed.total_donated),
            donors_count: Set(computed.donors_count),
            last_donors: Set(computed.last_donors),
            end_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!("recompute sweep rewrote {} campaign(s)", results.len());
    Ok(results)
}

struct ComputedAggregates {
    total_donated: f64,
    donors_count: i32,
    last_donors: LastDonors,
}

impl ComputedAggregates {
    const fn totals(&self) -> CampaignTotals {
        CampaignTotals {
            total_donated: self.total_donated,
            donors_count: self.donors_count,
        }
    }
}

fn aggregates_of_nothing() -> ComputedAggregates {
    ComputedAggregates {
        total_donated: 0.0,
        donors_count: 0,
        last_donors: LastDonors::default(),
    }
}

/// Folds one campaign's confirmed donations into fresh aggregates. The
/// recent-donor list holds the most recently created entries, newest first.
fn aggregates_of(mut rows: Vec<donation::Model>) -> ComputedAggregates {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total_donated = rows.iter().map(|row| row.amount).sum();
    let donors_count = i32::try_from(rows.len()).unwrap_or(i32::MAX);
    let last_donors = rows
        .iter()
        .take(SWEEP_LAST_DONORS)
        .map(|row| DonorEntry {
            name: row
                .donor_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_DONOR.to_string()),
            amount: row.amount,
            at: row.created_at,
        })
        .collect();

    ComputedAggregates {
        total_donated,
        donors_count,
        last_donors: LastDonors(last_donors),
    }
}
