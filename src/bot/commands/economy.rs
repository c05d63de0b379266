//! Economy Discord commands - wallets, gifts, work and the tool shop.
//!
//! Every command here is limited to the configured economy channels.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            commands::{ensure_economy_channel, guild_of},
            handlers::render,
        },
        core::{amount, shop, wallet, work},
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;

    /// Shows your wallet or someone else's.
    #[poise::command(slash_command, guild_only)]
    pub async fn balance(
        ctx: Context<'_>,
        #[description = "Whose wallet to show"] user: Option<serenity::User>,
    ) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let target = user.as_ref().unwrap_or_else(|| ctx.author());
        let user_id = target.id.to_string();

        let purse = wallet::create_wallet(&ctx.data().database, &user_id, &guild_id).await?;
        ctx.send(
            poise::CreateReply::default()
                .embed(render::balance_embed(&ctx.data().config, &user_id, &purse)),
        )
        .await?;
        Ok(())
    }

    /// Gifts money to another member. An amount of 0 gifts your whole balance.
    #[poise::command(slash_command, guild_only)]
    pub async fn gift(
        ctx: Context<'_>,
        #[description = "Who receives the money"] user: serenity::User,
        #[description = "Amount, e.g. 50k. 0 sends everything"] amount: String,
    ) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let config = &ctx.data().config;

        if user.bot {
            return Err(Error::InvalidRecipient {
                reason: "You can't gift money to bots.".to_string(),
            });
        }
        if config.economy.gift_blocked_user_ids.contains(&user.id.get()) {
            return Err(Error::InvalidRecipient {
                reason: "You can't gift money to this user.".to_string(),
            });
        }

        let requested = amount::parse_amount(&amount)?;
        let sender_id = ctx.author().id.to_string();
        let recipient_id = user.id.to_string();
        let receipt = wallet::gift(
            &ctx.data().database,
            &guild_id,
            &sender_id,
            &recipient_id,
            requested,
            config.economy.gift_minimum,
        )
        .await?;

        ctx.say(format!(
            "<@{sender_id}> gifted **{}** to <@{recipient_id}>",
            config.money(receipt.amount)
        ))
        .await?;
        Ok(())
    }

    /// Creates money out of thin air.
    #[poise::command(slash_command, guild_only, default_member_permissions = "ADMINISTRATOR")]
    pub async fn spawn(
        ctx: Context<'_>,
        #[description = "Amount, e.g. 1m"] amount: String,
        #[description = "Who receives the money (defaults to you)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let amount = amount::parse_amount(&amount)?;
        let target = user.as_ref().unwrap_or_else(|| ctx.author());
        let user_id = target.id.to_string();

        let purse = wallet::spawn(&ctx.data().database, &user_id, &guild_id, amount).await?;
        let config = &ctx.data().config;
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "Spawned **{}** for <@{user_id}>. New balance: **{}**",
                    config.money(amount),
                    config.money(purse.balance)
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Goes fishing.
    #[poise::command(slash_command, guild_only)]
    pub async fn fish(ctx: Context<'_>) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let config = &ctx.data().config;

        let result = work::go_fishing(
            &ctx.data().database,
            &user_id,
            &guild_id,
            &config.economy.fish,
            config.clan.bonus_level_divisor,
            Utc::now(),
        )
        .await;
        let (scenario, outcome) = match result {
            Ok(caught) => caught,
            Err(Error::OnCooldown { until }) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!(
                            "You scared all the fish away. Try your luck <t:{}:R>",
                            until.timestamp()
                        ))
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        ctx.send(
            poise::CreateReply::default().embed(render::fish_embed(config, scenario, &outcome)),
        )
        .await?;
        Ok(())
    }

    /// Claims the daily reward.
    #[poise::command(slash_command, guild_only)]
    pub async fn daily(ctx: Context<'_>) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let config = &ctx.data().config;

        let outcome = work::perform_work(
            &ctx.data().database,
            &user_id,
            &guild_id,
            work::WorkKind::Daily,
            &config.economy.daily,
            config.economy.daily_reward,
            config.clan.bonus_level_divisor,
            Utc::now(),
        )
        .await?;

        ctx.send(poise::CreateReply::default().embed(render::daily_embed(config, &outcome)))
            .await?;
        Ok(())
    }

    /// Buys and sells tools.
    #[poise::command(slash_command, guild_only, subcommands("buy", "sell"), subcommand_required)]
    pub async fn shop(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Shows the tools for sale.
    #[poise::command(slash_command, guild_only)]
    pub async fn buy(ctx: Context<'_>) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();

        let token =
            shop::open_menu(&ctx.data().database, &user_id, &guild_id, false, Utc::now()).await?;
        let (embed, components) = render::buy_menu(&ctx.data().config, &token);
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Sells one of your tools for half its price.
    #[poise::command(slash_command, guild_only)]
    pub async fn sell(ctx: Context<'_>) -> Result<()> {
        ensure_economy_channel(ctx)?;
        let guild_id = guild_of(ctx)?;
        let user_id = ctx.author().id.to_string();
        let db = &ctx.data().database;

        let owned = shop::inventory(db, &user_id, &guild_id).await?;
        if owned.is_empty() {
            ctx.send(
                poise::CreateReply::default()
                    .content("You don't own any tools.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
        let token = shop::open_menu(db, &user_id, &guild_id, true, Utc::now()).await?;
        let (embed, components) = render::sell_menu(&ctx.data().config, &token, &owned);
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
