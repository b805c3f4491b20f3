//! Campaign store helpers - creation and lookup.
//!
//! Campaigns are normally managed by an external admin flow; these helpers
//! are the minimal surface the service exposes so the system can be operated
//! end to end. The aggregate columns always start at zero and are only ever
//! moved by the aggregation worker, the payment recorder, and the recompute
//! sweep.

use crate::{
    entities::{Campaign, CampaignStatus, LastDonors, campaign},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};

/// Creates a campaign with zeroed aggregates.
///
/// # Errors
/// Returns a validation error when the id is blank or already taken, or when
/// the goal is present but not a positive finite number.
pub async fn create_campaign(
    db: &DatabaseConnection,
    id: String,
    title: Option<String>,
    goal: Option<f64>,
    status: CampaignStatus,
    end_at: Option<DateTimeUtc>,
) -> Result<campaign::Model> {
    let id = id.trim().to_string();
    if id.is_empty() {
        return Err(Error::Validation {
            message: "campaign id is required".to_string(),
        });
    }
    if let Some(goal) = goal {
        if !goal.is_finite() || goal <= 0.0 {
            return Err(Error::InvalidAmount { amount: goal });
        }
    }

    let existing = Campaign::find_by_id(&id).one(db).await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: format!("campaign '{id}' already exists"),
        });
    }

    let now = Utc::now();
    campaign::ActiveModel {
        id: Set(id),
        title: Set(title),
        goal: Set(goal),
        status: Set(status),
        total_donated: Set(0.0),
        donors_count: Set(0),
        last_donors: Set(LastDonors::default()),
        end_at: Set(end_at),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Looks up a campaign by id.
///
/// # Errors
/// Returns [`Error::CampaignNotFound`] when no row matches.
pub async fn get_campaign(db: &DatabaseConnection, id: &str) -> Result<campaign::Model> {
    Campaign::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CampaignNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_get_campaign() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_campaign(
            &db,
            "river-cleanup".to_string(),
            Some("River Cleanup".to_string()),
            Some(5000.0),
            CampaignStatus::Active,
            Some(test_time(86_400)),
        )
        .await?;
        assert_eq!(created.total_donated, 0.0);
        assert_eq!(created.donors_count, 0);
        assert!(created.last_donors.0.is_empty());

        let fetched = get_campaign(&db, "river-cleanup").await?;
        assert_eq!(fetched, created);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_campaign(&db, "river-cleanup").await?;

        let result = create_campaign(
            &db,
            "river-cleanup".to_string(),
            None,
            None,
            CampaignStatus::Draft,
            None,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_id_and_bad_goal_are_rejected() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_campaign(
            &db,
            "   ".to_string(),
            None,
            None,
            CampaignStatus::Draft,
            None,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        for goal in [0.0, -100.0, f64::NAN] {
            let result = create_campaign(
                &db,
                "with-goal".to_string(),
                None,
                Some(goal),
                CampaignStatus::Draft,
                None,
            )
            .await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_get_unknown_campaign_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_campaign(&db, "ghost").await;
        assert!(matches!(result.unwrap_err(), Error::CampaignNotFound { .. }));
        Ok(())
    }
}
