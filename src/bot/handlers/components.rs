//! Button, select menu and modal dispatch.
//!
//! Every custom id is a stored interaction token. The token is resolved and
//! decoded first; the decoded [`PendingAction`] decides which core operation
//! runs. Failures are answered with [`Error::user_message`].

use super::render;
use crate::{
    bot::{BotData, log_failure},
    core::{
        clan,
        connect4::{Color, MoveOutcome, game, view},
        interaction::{self, PendingAction, ResolvedInteraction},
        shop,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::instrument;

/// Entry point for every interaction that is not a slash command.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &BotData,
) {
    match interaction {
        serenity::Interaction::Component(component) => {
            if let Err(error) = handle_component(ctx, component, data).await {
                log_failure(&error, &component.data.custom_id);
                if let Err(e) = component.create_response(&ctx.http, error_response(&error)).await {
                    tracing::error!(error = %e, "Failed to send error message");
                }
            }
        }
        serenity::Interaction::Modal(modal) => {
            if let Err(error) = handle_modal(ctx, modal, data).await {
                log_failure(&error, &modal.data.custom_id);
                if let Err(e) = modal.create_response(&ctx.http, error_response(&error)).await {
                    tracing::error!(error = %e, "Failed to send error message");
                }
            }
        }
        _ => {}
    }
}

fn error_response(error: &Error) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(error.user_message())
            .ephemeral(error.is_ephemeral()),
    )
}

fn guild_of(guild_id: Option<serenity::GuildId>) -> Result<String> {
    guild_id.map(|id| id.to_string()).ok_or(Error::GuildOnly)
}

fn selected_value(component: &serenity::ComponentInteraction) -> Result<&str> {
    match &component.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::WrongInteractionType {
                expected: "a select menu".to_string(),
            }),
        _ => Err(Error::WrongInteractionType {
            expected: "a select menu".to_string(),
        }),
    }
}

fn modal_value(modal: &serenity::ModalInteraction, input_id: &str) -> String {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == input_id => {
                input.value.clone()
            }
            _ => None,
        })
        .unwrap_or_default()
}

async fn update(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    message: serenity::CreateInteractionResponseMessage,
) -> Result<()> {
    component
        .create_response(&ctx.http, serenity::CreateInteractionResponse::UpdateMessage(message))
        .await?;
    Ok(())
}

#[instrument(skip_all, fields(custom_id = %component.data.custom_id, user = %component.user.id))]
async fn handle_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let db = &data.database;
    let config = &data.config;
    let now = Utc::now();
    let resolved = interaction::resolve(db, &component.data.custom_id).await?;
    let guild_id = guild_of(component.guild_id)?;
    let user_id = component.user.id.to_string();

    match &resolved.action {
        PendingAction::ClanCreate => {
            let prompt = clan::open_name_prompt(
                db,
                &resolved,
                &user_id,
                &guild_id,
                &component.channel_id.to_string(),
                &component.message.id.to_string(),
                config.interactions.wizard_ttl_secs,
                now,
            )
            .await?;
            component
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Modal(render::clan_name_modal(&prompt)),
                )
                .await?;
        }
        PendingAction::ClanCreateWizardCancel => {
            clan::cancel_create_wizard(db, &resolved, &user_id, &guild_id, now).await?;
            update(
                ctx,
                component,
                serenity::CreateInteractionResponseMessage::new()
                    .content("Clan creation cancelled.")
                    .embeds(Vec::new())
                    .components(Vec::new()),
            )
            .await?;
        }
        PendingAction::ClanCreatePromptName(_) => {
            return Err(Error::WrongInteractionType {
                expected: "a form".to_string(),
            });
        }
        PendingAction::Connect4Accept(_) => {
            let challenger_color = if rand::random::<bool>() {
                Color::Red
            } else {
                Color::Yellow
            };
            let started = game::accept_challenge(
                db,
                &resolved,
                &user_id,
                &guild_id,
                &component.channel_id.to_string(),
                config.connect4.move_time_secs,
                challenger_color,
                now,
            )
            .await?;
            let tokens = game::issue_board_tokens(db, &started, now).await?;
            let (embed, components) = render::game_message(config, &started, Some(&tokens));
            update(
                ctx,
                component,
                serenity::CreateInteractionResponseMessage::new()
                    .content(format!(
                        "<@{}> <@{}>",
                        started.seats.challenger, started.seats.opponent
                    ))
                    .embed(embed)
                    .components(components),
            )
            .await?;
        }
        PendingAction::Connect4Decline(_) => {
            let challenge = game::decline_challenge(db, &resolved, &user_id, &guild_id, now).await?;
            update(
                ctx,
                component,
                serenity::CreateInteractionResponseMessage::new()
                    .content(format!(
                        "<@{}> declined the challenge from <@{}>.",
                        challenge.opponent_id, challenge.challenger_id
                    ))
                    .components(Vec::new()),
            )
            .await?;
        }
        PendingAction::Connect4Move(_) => {
            let column = selected_value(component)?;
            match game::submit_move(db, &resolved, &user_id, &guild_id, column, now).await? {
                MoveOutcome::Suggested { column, .. } => {
                    component
                        .create_response(
                            &ctx.http,
                            serenity::CreateInteractionResponse::Message(
                                serenity::CreateInteractionResponseMessage::new()
                                    .content(view::suggestion_message(&user_id, column)),
                            ),
                        )
                        .await?;
                }
                MoveOutcome::Updated(current) => {
                    update_board(ctx, component, data, &current).await?;
                }
            }
        }
        PendingAction::Connect4Forfeit(_) => {
            let ended = game::forfeit_game(db, &resolved, &user_id, &guild_id, now).await?;
            update_board(ctx, component, data, &ended).await?;
        }
        PendingAction::ShopBuyToolMenu(_) => {
            let item = selected_value(component)?;
            let receipt = shop::buy_tool(db, &resolved, &user_id, &guild_id, item, now).await?;
            update(
                ctx,
                component,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(render::receipt_embed(config, &receipt, false))
                    .components(Vec::new()),
            )
            .await?;
        }
        PendingAction::ShopSellToolMenu(_) => {
            let item = selected_value(component)?;
            let receipt = shop::sell_tool(db, &resolved, &user_id, &guild_id, item, now).await?;
            update(
                ctx,
                component,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(render::receipt_embed(config, &receipt, true))
                    .components(Vec::new()),
            )
            .await?;
        }
    }
    Ok(())
}

/// Redraws the board in place, with fresh tokens while it is still open.
async fn update_board(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    current: &game::Game,
) -> Result<()> {
    let tokens = if current.is_over() {
        None
    } else {
        Some(game::issue_board_tokens(&data.database, current, Utc::now()).await?)
    };
    let (embed, components) = render::game_message(&data.config, current, tokens.as_ref());
    update(
        ctx,
        component,
        serenity::CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(components),
    )
    .await
}

#[instrument(skip_all, fields(custom_id = %modal.data.custom_id, user = %modal.user.id))]
async fn handle_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &BotData,
) -> Result<()> {
    let db = &data.database;
    let config = &data.config;
    let now = Utc::now();
    let resolved = interaction::resolve(db, &modal.data.custom_id).await?;
    let guild_id = guild_of(modal.guild_id)?;
    let user_id = modal.user.id.to_string();
    let raw_name = modal_value(modal, render::CLAN_NAME_INPUT);

    let created = match clan::complete_create_wizard(
        db,
        &resolved,
        &user_id,
        &guild_id,
        &raw_name,
        config.clan.create_price,
        now,
    )
    .await
    {
        Ok(created) => created,
        Err(Error::InsufficientFunds { balance, required }) => {
            let content = format!(
                "Insufficient funds. Creating a clan costs **{}**, you have **{}** in your wallet, \
                 you need **{}** more to afford it.",
                config.money(required),
                config.money(balance),
                config.money(required - balance)
            );
            modal
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .content(content)
                            .ephemeral(true),
                    ),
                )
                .await?;
            return Ok(());
        }
        Err(error) => return Err(error),
    };

    close_wizard_message(ctx, &resolved, &created).await;
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new().content(format!(
                    "<@{user_id}> founded the clan **{}**!",
                    created.clan.name
                )),
            ),
        )
        .await?;
    Ok(())
}

/// Strips the buttons from the wizard message once the clan exists.
async fn close_wizard_message(
    ctx: &serenity::Context,
    resolved: &ResolvedInteraction,
    created: &clan::CreatedClan,
) {
    let channel = created
        .channel_id
        .as_deref()
        .or(resolved.record.channel_id.as_deref())
        .and_then(|id| id.parse::<u64>().ok());
    let message = created.wizard_message_id.parse::<u64>().ok();
    let (Some(channel), Some(message)) = (channel, message) else {
        return;
    };

    let edit = serenity::EditMessage::new()
        .content("Clan created.")
        .embeds(Vec::new())
        .components(Vec::new());
    if let Err(e) = serenity::ChannelId::new(channel)
        .edit_message(&ctx.http, serenity::MessageId::new(message), edit)
        .await
    {
        tracing::warn!(error = %e, "Failed to close clan wizard message");
    }
}
