//! Clan Discord commands - the creation wizard, leaving and the overview.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::guild_of, handlers::render},
        core::clan::{self, LeaveOutcome},
        errors::{Error, Result},
    };
    use chrono::Utc;

    /// Clan management.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("create", "leave", "info"),
        subcommand_required
    )]
    pub async fn clan(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Starts the clan creation wizard.
    ///
    /// Running it again retires the buttons of any earlier wizard.
    #[poise::command(slash_command, guild_only)]
    pub async fn create(ctx: Context<'_>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let config = &ctx.data().config;

        let tokens = clan::start_create_wizard(
            &ctx.data().database,
            &user_id,
            &guild_id,
            config.interactions.wizard_ttl_secs,
            Utc::now(),
        )
        .await?;
        let (embed, components) = render::wizard_prompt(config, &tokens.proceed, &tokens.cancel);
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components),
        )
        .await?;
        Ok(())
    }

    /// Leaves your clan. The last member to leave disbands it.
    #[poise::command(slash_command, guild_only)]
    pub async fn leave(ctx: Context<'_>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();

        let message = match clan::leave_clan(&ctx.data().database, &user_id, &guild_id).await? {
            LeaveOutcome::Disbanded {
                clan_name,
                joined_at,
            } => format!(
                "You left **{clan_name}** (member since <t:{}:D>). You were the last member, so the clan has been disbanded.",
                joined_at.timestamp()
            ),
            LeaveOutcome::Left {
                clan_name,
                joined_at,
            } => format!(
                "You left **{clan_name}** (member since <t:{}:D>).",
                joined_at.timestamp()
            ),
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Shows your clan.
    #[poise::command(slash_command, guild_only)]
    pub async fn info(ctx: Context<'_>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let db = &ctx.data().database;

        let membership = clan::get_user_clan(db, &user_id, &guild_id)
            .await?
            .ok_or(Error::NotInClan)?;
        let summary = clan::clan_summary(db, membership.clan).await?;
        ctx.send(
            poise::CreateReply::default().embed(render::clan_embed(&ctx.data().config, &summary)),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
