use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Campaign '{id}' not found")]
    CampaignNotFound { id: String },

    #[error("Donation '{id}' not found")]
    DonationNotFound { id: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl Error {
    /// Whether this error is a transient write conflict worth retrying.
    ///
    /// SQLite reports lock contention as `SQLITE_BUSY`/`SQLITE_LOCKED`,
    /// which surface through sqlx with a "database is locked" message.
    #[must_use]
    pub fn is_transient_conflict(&self) -> bool {
        match self {
            Error::Database(db_err) => {
                let message = db_err.to_string();
                message.contains("database is locked")
                    || message.contains("database table is locked")
            }
            _ => false,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
