//! Donation intake helpers - writes that announce themselves on the feed.
//!
//! Every helper performs the donation table write, captures the row state
//! before and after, and publishes the pair on the donation change feed so
//! the aggregation worker can fold it into the owning campaign. The donation
//! table stays the source of truth; the campaign aggregates merely follow it.

use crate::{
    core::aggregator::DonationSnapshot,
    entities::{Donation, DonationStatus, donation},
    errors::{Error, Result},
    events::{DonationChange, DonationFeed},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use uuid::Uuid;

/// Fields accepted when a donation is created.
#[derive(Debug, Clone, Default)]
pub struct NewDonation {
    /// Donation id, generated as a UUID when absent
    pub id: Option<String>,
    /// Campaign the donation is attributed to
    pub campaign_id: Option<String>,
    /// Initial settlement state
    pub status: DonationStatus,
    /// Donated amount in major currency units
    pub amount: f64,
    /// Whether the donor asked not to be named publicly
    pub is_anonymous: bool,
    /// Donor display name as entered at checkout
    pub donor_name: Option<String>,
    /// Explicit confirmation time; defaults to now for confirmed donations
    pub confirmed_at: Option<DateTimeUtc>,
}

/// Partial donation edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DonationPatch {
    /// Re-attributes the donation to another campaign
    pub campaign_id: Option<String>,
    /// New settlement state
    pub status: Option<DonationStatus>,
    /// New amount in major currency units
    pub amount: Option<f64>,
    /// New anonymity flag
    pub is_anonymous: Option<bool>,
    /// New donor display name
    pub donor_name: Option<String>,
    /// Explicit confirmation time
    pub confirmed_at: Option<DateTimeUtc>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Creates a donation record and announces it on the feed.
///
/// Donations created directly in `confirmed` status get `confirmed_at = now`
/// unless the intake supplied an explicit timestamp.
///
/// # Errors
/// Returns a validation error when the amount is negative or not finite.
pub async fn create_donation(
    db: &DatabaseConnection,
    feed: &DonationFeed,
    input: NewDonation,
) -> Result<donation::Model> {
    validate_amount(input.amount)?;

    let now = Utc::now();
    let id = input
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let confirmed_at = input
        .confirmed_at
        .or_else(|| (input.status == DonationStatus::Confirmed).then_some(now));

    let model = donation::ActiveModel {
        id: Set(id),
        campaign_id: Set(input.campaign_id),
        status: Set(input.status),
        amount: Set(input.amount),
        is_anonymous: Set(input.is_anonymous),
        donor_name: Set(input.donor_name),
        confirmed_at: Set(confirmed_at),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    feed.publish(DonationChange {
        donation_id: model.id.clone(),
        before: None,
        after: Some(DonationSnapshot::from(&model)),
    });
    Ok(model)
}

/// Applies a partial edit to a donation and announces the transition.
///
/// A donation entering `confirmed` for the first time gets
/// `confirmed_at = now` unless the patch carries an explicit timestamp.
///
/// # Errors
/// Returns [`Error::DonationNotFound`] for an unknown id and a validation
/// error for a bad amount.
pub async fn update_donation(
    db: &DatabaseConnection,
    feed: &DonationFeed,
    id: &str,
    patch: DonationPatch,
) -> Result<donation::Model> {
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }

    let existing = Donation::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::DonationNotFound { id: id.to_string() })?;
    let before = DonationSnapshot::from(&existing);

    let entering_confirmed = patch.status == Some(DonationStatus::Confirmed)
        && existing.status != DonationStatus::Confirmed;

    let mut active: donation::ActiveModel = existing.into();
    if let Some(campaign_id) = patch.campaign_id {
        active.campaign_id = Set(Some(campaign_id));
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(amount) = patch.amount {
        active.amount = Set(amount);
    }
    if let Some(is_anonymous) = patch.is_anonymous {
        active.is_anonymous = Set(is_anonymous);
    }
    if let Some(donor_name) = patch.donor_name {
        active.donor_name = Set(Some(donor_name));
    }
    if let Some(confirmed_at) = patch.confirmed_at {
        active.confirmed_at = Set(Some(confirmed_at));
    } else if entering_confirmed && before.confirmed_at.is_none() {
        active.confirmed_at = Set(Some(Utc::now()));
    }
    let model = active.update(db).await?;

    feed.publish(DonationChange {
        donation_id: model.id.clone(),
        before: Some(before),
        after: Some(DonationSnapshot::from(&model)),
    });
    Ok(model)
}

/// Deletes a donation and announces the removal.
///
/// # Errors
/// Returns [`Error::DonationNotFound`] for an unknown id.
pub async fn delete_donation(db: &DatabaseConnection, feed: &DonationFeed, id: &str) -> Result<()> {
    let existing = Donation::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::DonationNotFound { id: id.to_string() })?;
    let before = DonationSnapshot::from(&existing);

    Donation::delete_by_id(&existing.id).exec(db).await?;

    feed.publish(DonationChange {
        donation_id: existing.id,
        before: Some(before),
        after: None,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn confirmed_input(campaign_id: &str, amount: f64) -> NewDonation {
        NewDonation {
            campaign_id: Some(campaign_id.to_string()),
            status: DonationStatus::Confirmed,
            amount,
            donor_name: Some("Ada".to_string()),
            ..NewDonation::default()
        }
    }

    #[tokio::test]
    async fn test_create_publishes_create_change() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, mut rx) = DonationFeed::channel();

        let model = create_donation(&db, &feed, confirmed_input("river-cleanup", 50.0)).await?;
        assert!(!model.id.is_empty());
        assert!(model.confirmed_at.is_some());

        let change = rx.recv().await.unwrap();
        assert_eq!(change.donation_id, model.id);
        assert!(change.before.is_none());
        let after = change.after.unwrap();
        assert_eq!(after.status, DonationStatus::Confirmed);
        assert_eq!(after.amount, 50.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_pending_donation_has_no_confirmed_at() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, _rx) = DonationFeed::channel();

        let model = create_donation(
            &db,
            &feed,
            NewDonation {
                campaign_id: Some("river-cleanup".to_string()),
                amount: 40.0,
                ..NewDonation::default()
            },
        )
        .await?;
        assert_eq!(model.status, DonationStatus::Pending);
        assert!(model.confirmed_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_supplied_id_and_timestamp_are_kept() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, _rx) = DonationFeed::channel();

        let at = test_time(0);
        let model = create_donation(
            &db,
            &feed,
            NewDonation {
                id: Some("don_42".to_string()),
                confirmed_at: Some(at),
                ..confirmed_input("river-cleanup", 50.0)
            },
        )
        .await?;
        assert_eq!(model.id, "don_42");
        assert_eq!(model.confirmed_at, Some(at));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_publishes_transition_and_sets_confirmed_at() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, mut rx) = DonationFeed::channel();

        let created = create_donation(
            &db,
            &feed,
            NewDonation {
                campaign_id: Some("river-cleanup".to_string()),
                amount: 50.0,
                ..NewDonation::default()
            },
        )
        .await?;
        let _ = rx.recv().await.unwrap();

        let updated = update_donation(
            &db,
            &feed,
            &created.id,
            DonationPatch {
                status: Some(DonationStatus::Confirmed),
                ..DonationPatch::default()
            },
        )
        .await?;
        assert_eq!(updated.status, DonationStatus::Confirmed);
        assert!(updated.confirmed_at.is_some());

        let change = rx.recv().await.unwrap();
        let before = change.before.unwrap();
        let after = change.after.unwrap();
        assert_eq!(before.status, DonationStatus::Pending);
        assert_eq!(after.status, DonationStatus::Confirmed);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_original_confirmed_at_on_reconfirm() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, _rx) = DonationFeed::channel();

        let at = test_time(0);
        let created = create_donation(
            &db,
            &feed,
            NewDonation {
                confirmed_at: Some(at),
                ..confirmed_input("river-cleanup", 50.0)
            },
        )
        .await?;

        // Refund, then confirm again: the first confirmation time survives.
        update_donation(
            &db,
            &feed,
            &created.id,
            DonationPatch {
                status: Some(DonationStatus::Refunded),
                ..DonationPatch::default()
            },
        )
        .await?;
        let reconfirmed = update_donation(
            &db,
            &feed,
            &created.id,
            DonationPatch {
                status: Some(DonationStatus::Confirmed),
                ..DonationPatch::default()
            },
        )
        .await?;
        assert_eq!(reconfirmed.confirmed_at, Some(at));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_publishes_removal() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, mut rx) = DonationFeed::channel();

        let created = create_donation(&db, &feed, confirmed_input("river-cleanup", 50.0)).await?;
        let _ = rx.recv().await.unwrap();

        delete_donation(&db, &feed, &created.id).await?;
        assert!(Donation::find_by_id(&created.id).one(&db).await?.is_none());

        let change = rx.recv().await.unwrap();
        assert!(change.after.is_none());
        assert_eq!(change.before.unwrap().amount, 50.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_amounts_are_rejected_before_any_write() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, mut rx) = DonationFeed::channel();

        for amount in [-1.0, f64::NAN, f64::NEG_INFINITY] {
            let result =
                create_donation(&db, &feed, confirmed_input("river-cleanup", amount)).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        }
        assert!(Donation::find().all(&db).await?.is_empty());
        assert!(rx.try_recv().is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_donation_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let (feed, _rx) = DonationFeed::channel();

        let result = update_donation(&db, &feed, "ghost", DonationPatch::default()).await;
        assert!(matches!(result.unwrap_err(), Error::DonationNotFound { .. }));

        let result = delete_donation(&db, &feed, "ghost").await;
        assert!(matches!(result.unwrap_err(), Error::DonationNotFound { .. }));

        Ok(())
    }
}
