//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod campaign;
pub mod donation;
pub mod payment;

// Re-export specific types to avoid conflicts
pub use campaign::{CampaignStatus, DonorEntry, Entity as Campaign, LastDonors};
pub use donation::{DonationStatus, Entity as Donation};
pub use payment::Entity as Payment;
