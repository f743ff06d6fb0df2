/// Database configuration and connection management
pub mod database;

/// Shop settings and catalogue loading from config.toml
pub mod catalog;

/// Admin user configuration from environment variables
pub mod admins;
