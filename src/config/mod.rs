/// Database connection and schema management
pub mod database;

/// Service settings from config.toml and environment variables
pub mod settings;
