/// Database configuration and connection management
pub mod database;

/// Game and economy settings from config.toml
pub mod settings;

pub use settings::{AppConfig, load_default_config};
