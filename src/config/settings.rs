//! Game and economy settings loaded from config.toml
//!
//! Every field has a default, so a missing file or a partial file is fine. The
//! Discord token and database URL are secrets and stay in the environment; see
//! [`crate::config::database`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level structure of config.toml
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Currency display settings
    pub currency: CurrencyConfig,
    /// Wallet and earning command settings
    pub economy: EconomyConfig,
    /// Clan settings
    pub clan: ClanConfig,
    /// Connect-4 settings
    pub connect4: Connect4Config,
    /// Pending interaction settings
    pub interactions: InteractionConfig,
}

/// How amounts are shown to users
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Symbol placed in front of every amount
    pub symbol: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
        }
    }
}

/// Limits for a cooldown-gated earning command
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct WorkLimit {
    /// Length of the cooldown window in seconds
    pub cooldown_secs: i64,
    /// Uses allowed inside one window
    pub uses: u64,
}

/// Wallet and earning command settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Channels economy commands are limited to; empty allows every channel
    pub channel_ids: Vec<u64>,
    /// Smallest amount that can be gifted
    pub gift_minimum: i64,
    /// Users that never receive gifts
    pub gift_blocked_user_ids: Vec<u64>,
    /// `/fish` limits
    pub fish: WorkLimit,
    /// `/daily` limits
    pub daily: WorkLimit,
    /// Fixed `/daily` payout before clan bonus
    pub daily_reward: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            channel_ids: Vec::new(),
            gift_minimum: 100,
            gift_blocked_user_ids: Vec::new(),
            fish: WorkLimit {
                cooldown_secs: 60 * 60,
                uses: 5,
            },
            daily: WorkLimit {
                cooldown_secs: 24 * 60 * 60,
                uses: 1,
            },
            daily_reward: 10_000,
        }
    }
}

/// Clan settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClanConfig {
    /// Price charged to found a clan
    pub create_price: i64,
    /// Clan level is divided by this to get the work reward bonus multiplier
    pub bonus_level_divisor: i64,
}

impl Default for ClanConfig {
    fn default() -> Self {
        Self {
            create_price: 500_000,
            bonus_level_divisor: 20,
        }
    }
}

/// Connect-4 settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Connect4Config {
    /// Seconds each player has per move
    pub move_time_secs: i64,
    /// Largest wager a challenge may carry
    pub max_wager: i64,
}

impl Default for Connect4Config {
    fn default() -> Self {
        Self {
            move_time_secs: 5 * 60,
            max_wager: 10_000_000,
        }
    }
}

/// Pending interaction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Lifetime of clan wizard buttons and modals in seconds
    pub wizard_ttl_secs: i64,
    /// Lifetime of a Connect-4 challenge in seconds
    pub challenge_ttl_secs: i64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            wizard_ttl_secs: 15 * 60,
            challenge_ttl_secs: 10 * 60,
        }
    }
}

impl AppConfig {
    /// Formats an amount with the configured currency symbol.
    #[must_use]
    pub fn money(&self, amount: i64) -> String {
        let formatted = crate::core::amount::format_amount(amount.abs());
        if amount < 0 {
            format!("-{}{formatted}", self.currency.symbol)
        } else {
            format!("{}{formatted}", self.currency.symbol)
        }
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    for (name, limit) in [("fish", config.economy.fish), ("daily", config.economy.daily)] {
        if limit.cooldown_secs <= 0 || limit.uses == 0 {
            return Err(Error::Config {
                message: format!("economy.{name} needs a positive cooldown and at least one use"),
            });
        }
    }
    if config.clan.bonus_level_divisor <= 0 {
        return Err(Error::Config {
            message: "clan.bonus_level_divisor must be positive".to_string(),
        });
    }
    if config.connect4.move_time_secs <= 0 {
        return Err(Error::Config {
            message: "connect4.move_time_secs must be positive".to_string(),
        });
    }
    Ok(())
}

/// Loads configuration from a TOML file. A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, the TOML syntax is
/// invalid, or a value is out of range.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    tracing::debug!(path = %path.display(), "Loading configuration");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH`, falling back to ./config.toml
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [currency]
            symbol = "🪙"

            [economy]
            gift_minimum = 250
            channel_ids = [123, 456]

            [economy.fish]
            cooldown_secs = 600
            uses = 3
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.currency.symbol, "🪙");
        assert_eq!(config.economy.gift_minimum, 250);
        assert_eq!(config.economy.channel_ids, vec![123, 456]);
        assert_eq!(config.economy.fish.uses, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.economy.daily.uses, 1);
        assert_eq!(config.clan.create_price, 500_000);
        assert_eq!(config.connect4.move_time_secs, 300);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.currency.symbol, "$");
        assert_eq!(config.clan.bonus_level_divisor, 20);
    }

    #[test]
    fn test_rejects_zero_uses() {
        let toml_str = r"
            [economy.daily]
            cooldown_secs = 100
            uses = 0
        ";
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_money_formatting() {
        let config = AppConfig::default();
        assert_eq!(config.money(1_234_567), "$1,234,567");
        assert_eq!(config.money(-5_000), "-$5,000");
        assert_eq!(config.money(0), "$0");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("definitely/not/here.toml").unwrap();
        assert_eq!(config.economy.gift_minimum, 100);
    }
}
