/// Database configuration and connection management
pub mod database;

/// Program rules loading from config.toml
pub mod program;

/// Admin user configuration from environment variables
pub mod admins;
