//! Campaign lifecycle transitions - closing campaigns past their end time.

use crate::{
    core::retry_on_conflict,
    entities::{Campaign, CampaignStatus, campaign},
    errors::Result,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::prelude::*;

/// Closes every active campaign whose end time has passed.
///
/// One batched update: rows with `status == active` and `end_at <= now` get
/// `status = closed` and a fresh `updated_at`. Campaigns without an end time
/// never match, and closing is one-directional; nothing here (or anywhere in
/// the scheduler) reopens a closed campaign. Returns the number of campaigns
/// closed.
///
/// # Errors
/// Returns an error when the update fails for a non-transient reason.
pub async fn close_expired_campaigns(db: &DatabaseConnection) -> Result<u64> {
    retry_on_conflict(|| async {
        let now = Utc::now();
        let result = Campaign::update_many()
            .col_expr(campaign::Column::Status, Expr::value(CampaignStatus::Closed))
            .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
            .filter(campaign::Column::Status.eq(CampaignStatus::Active))
            .filter(campaign::Column::EndAt.lte(now))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    })
    .await
}
