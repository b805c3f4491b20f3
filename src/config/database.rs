//! Database configuration module for `CampaignLedger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL.

use std::path::Path;

use crate::entities::{Campaign, Donation, Payment};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database behind the given `SeaORM` URL.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` URL if it does not
/// exist yet. `SQLite` creates missing database files (with `mode=rwc`) but
/// not missing directories, so a fresh checkout would otherwise fail to open
/// the default `sqlite://data/...` URL. In-memory URLs are left alone.
fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// This function uses the `DeriveEntityModel` macros to automatically generate proper SQL
/// statements for table creation, ensuring the database schema matches the Rust struct definitions.
/// It creates tables for campaigns, donations, and payments. Statements are built with
/// `IF NOT EXISTS` so the call is safe on every startup against an existing database file.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut campaign_table = schema.create_table_from_entity(Campaign);
    let mut donation_table = schema.create_table_from_entity(Donation);
    let mut payment_table = schema.create_table_from_entity(Payment);

    db.execute(builder.build(campaign_table.if_not_exists()))
        .await?;
    db.execute(builder.build(donation_table.if_not_exists()))
        .await?;
    db.execute(builder.build(payment_table.if_not_exists()))
        .await?;

    Ok(())
}

/// Connects to the database and ensures the schema exists.
///
/// This is the single entry point `main` uses to bring up storage.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection> {
    ensure_sqlite_parent_dir(database_url)?;
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        campaign::Model as CampaignModel, donation::Model as DonationModel,
        payment::Model as PaymentModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<CampaignModel> = Campaign::find().limit(1).all(&db).await?;
        let _: Vec<DonationModel> = Donation::find().limit(1).all(&db).await?;
        let _: Vec<PaymentModel> = Payment::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<CampaignModel> = Campaign::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_init_db() -> Result<()> {
        let db = init_db("sqlite::memory:").await?;
        let _: Vec<CampaignModel> = Campaign::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_init_db_creates_missing_parent_dir() -> Result<()> {
        let dir = std::env::temp_dir()
            .join(format!("campaign-ledger-{}", sea_orm::prelude::Uuid::new_v4()))
            .join("data");
        let url = format!("sqlite://{}/ledger.sqlite?mode=rwc", dir.display());

        let db = init_db(&url).await?;
        let _: Vec<CampaignModel> = Campaign::find().limit(1).all(&db).await?;

        drop(db);
        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_skips_memory_urls() -> Result<()> {
        ensure_sqlite_parent_dir("sqlite::memory:")?;
        ensure_sqlite_parent_dir("sqlite://:memory:")?;
        Ok(())
    }
}
