use guild_economy::{
    bot,
    config::{self, database},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Load config.toml
    let app_config = config::load_default_config()
        .inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;
    info!("Configuration loaded");

    // 4. Connect and create tables
    if let Some(dir) = sqlite_data_dir(&database::get_database_url()) {
        std::fs::create_dir_all(dir)?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!(error = %e, "Failed to connect to database"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized"))
        .inspect_err(|e| error!(error = %e, "Failed to create tables"))?;

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!(error = %e, "DISCORD_BOT_TOKEN not found"))
        .map_err(Error::EnvVar)?;
    let dev_guild = match env::var("DEV_GUILD_ID") {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(id) if id != 0 => Some(serenity::GuildId::new(id)),
            _ => {
                warn!(value = %raw, "Ignoring invalid DEV_GUILD_ID");
                None
            }
        },
        Err(_) => None,
    };

    bot::run_bot(token, Arc::new(app_config), db, dev_guild).await
}

/// Directory of a file-backed `SQLite` URL, so it can be created up front.
fn sqlite_data_dir(url: &str) -> Option<&str> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    let (dir, _) = path.rsplit_once('/')?;
    (!dir.is_empty()).then_some(dir)
}
