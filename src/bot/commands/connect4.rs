//! Connect-4 Discord commands - challenges and board display.
//!
//! Moves, forfeits and challenge answers arrive as components and are handled
//! in [`crate::bot::handlers::components`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::guild_of, handlers::render},
        core::{
            amount,
            connect4::game::{self, ChallengeRequest},
        },
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;

    /// Connect 4.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("challenge", "show"),
        subcommand_required
    )]
    pub async fn connect4(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Challenges someone to a game, optionally for money.
    #[poise::command(slash_command, guild_only)]
    pub async fn challenge(
        ctx: Context<'_>,
        #[description = "Who to play against"] opponent: serenity::User,
        #[description = "Amount both players put in, e.g. 10k"] wager: Option<String>,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        if opponent.bot {
            return Err(Error::InvalidRecipient {
                reason: "You can't challenge bots.".to_string(),
            });
        }
        let wager = wager.as_deref().map(amount::parse_amount).transpose()?.unwrap_or(0);
        let challenger_id = ctx.author().id.to_string();
        let opponent_id = opponent.id.to_string();
        let channel_id = ctx.channel_id().to_string();
        let config = &ctx.data().config;

        let request = ChallengeRequest {
            guild_id: &guild_id,
            channel_id: &channel_id,
            challenger_id: &challenger_id,
            opponent_id: &opponent_id,
            wager,
        };
        let tokens = game::issue_challenge(
            &ctx.data().database,
            request,
            config.connect4.max_wager,
            config.interactions.challenge_ttl_secs,
            Utc::now(),
        )
        .await?;

        let (content, components) =
            render::challenge_message(config, &tokens.payload, &tokens.accept, &tokens.decline);
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .components(components),
        )
        .await?;
        Ok(())
    }

    /// Shows your most recent game in this server.
    #[poise::command(slash_command, guild_only)]
    pub async fn show(ctx: Context<'_>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let db = &ctx.data().database;
        let now = Utc::now();

        let Some(latest) = game::find_latest_game(db, &guild_id, &user_id).await? else {
            ctx.send(
                poise::CreateReply::default()
                    .content("You haven't played any Connect 4 games here yet.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        };

        let current = game::settle_timeout(db, latest, now).await?;
        let tokens = if current.is_over() {
            None
        } else {
            Some(game::issue_board_tokens(db, &current, now).await?)
        };
        let (embed, components) =
            render::game_message(&ctx.data().config, &current, tokens.as_ref());
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
