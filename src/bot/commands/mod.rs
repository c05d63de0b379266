//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Clan commands
pub mod clan;

/// Connect-4 commands
pub mod connect4;

/// Wallet, work and shop commands
pub mod economy;

/// General utility commands
pub mod general;

use crate::{
    bot::{BotData, Context},
    errors::{Error, Result},
};

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        general::ping(),
        general::help(),
        economy::balance(),
        economy::gift(),
        economy::spawn(),
        economy::fish(),
        economy::daily(),
        economy::shop(),
        clan::clan(),
        connect4::connect4(),
    ]
}

/// Guild the command runs in, as stored in the database.
pub(crate) fn guild_of(ctx: Context<'_>) -> Result<String> {
    ctx.guild_id()
        .map(|id| id.to_string())
        .ok_or(Error::GuildOnly)
}

/// Refuses economy commands outside the configured channels.
pub(crate) fn ensure_economy_channel(ctx: Context<'_>) -> Result<()> {
    let allowed = &ctx.data().config.economy.channel_ids;
    if allowed.is_empty() || allowed.contains(&ctx.channel_id().get()) {
        Ok(())
    } else {
        Err(Error::WrongChannel)
    }
}
