/// Database configuration and connection management
pub mod database;

/// School configuration (seed families) loaded from config.toml
pub mod school;

/// HTTP server settings from environment variables
pub mod server;
