//! Embeds and components for every message the bot posts.
//!
//! Custom ids are always the id of a stored interaction token, never data.

use crate::{
    config::AppConfig,
    core::{
        clan::ClanSummary,
        connect4::{Column, Game, game::BoardTokens, view},
        interaction::ChallengePayload,
        shop::{OwnedTool, ShopReceipt, Tool},
        work::{FishScenario, WorkOutcome},
    },
    entities::{interaction as interaction_entity, wallet},
};
use poise::serenity_prelude as serenity;

/// Custom id of the text input in the clan name form.
pub const CLAN_NAME_INPUT: &str = "clan_name";

const ECONOMY_COLOR: u32 = 0x00ce_d1;
const SUCCESS_COLOR: u32 = 0x2ecc_71;
const LOSS_COLOR: u32 = 0xe74c_3c;

fn custom_id(token: &interaction_entity::Model) -> String {
    token.id.to_string()
}

/// Wallet overview.
#[must_use]
pub fn balance_embed(
    config: &AppConfig,
    user_id: &str,
    purse: &wallet::Model,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Wallet")
        .description(format!("<@{user_id}> has **{}**", config.money(purse.balance)))
        .color(ECONOMY_COLOR)
}

fn work_footer(outcome: &WorkOutcome, next_label: &str) -> String {
    match outcome.next_available {
        Some(next) => format!("{next_label} <t:{}:R>", next.timestamp()),
        None if outcome.uses_left == 1 => "1 use left".to_string(),
        None => format!("{} uses left", outcome.uses_left),
    }
}

fn payout_lines(config: &AppConfig, outcome: &WorkOutcome) -> String {
    if outcome.bonus.amount == 0 {
        return format!("You got **{}**", config.money(outcome.total));
    }
    format!(
        "You got **{}** (+{} clan bonus, {}%)",
        config.money(outcome.total),
        config.money(outcome.bonus.amount),
        outcome.bonus.percent()
    )
}

/// Result of a `/fish`. Discord embed footers can't render timestamps, so the
/// next-available time goes into the description.
#[must_use]
pub fn fish_embed(
    config: &AppConfig,
    scenario: FishScenario,
    outcome: &WorkOutcome,
) -> serenity::CreateEmbed {
    let money = if outcome.reward < 0 {
        format!("You lost **{}**", config.money(-outcome.total))
    } else if outcome.reward == 0 {
        "You got nothing.".to_string()
    } else {
        payout_lines(config, outcome)
    };
    serenity::CreateEmbed::new()
        .title("Fishing")
        .description(format!(
            "{}\n{money}\n\n{}",
            scenario.message(),
            work_footer(outcome, "Next fish")
        ))
        .color(if outcome.reward < 0 { LOSS_COLOR } else { ECONOMY_COLOR })
}

/// Result of a `/daily`.
#[must_use]
pub fn daily_embed(config: &AppConfig, outcome: &WorkOutcome) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Daily reward")
        .description(format!(
            "{}\n\n{}",
            payout_lines(config, outcome),
            work_footer(outcome, "Next daily")
        ))
        .color(SUCCESS_COLOR)
}

/// The buy menu.
#[must_use]
pub fn buy_menu(
    config: &AppConfig,
    token: &interaction_entity::Model,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let lines: Vec<String> = Tool::ALL
        .iter()
        .map(|t| format!("{} **{}** - {}", t.emoji(), t.name(), config.money(t.price())))
        .collect();
    let options = Tool::ALL
        .iter()
        .map(|t| {
            serenity::CreateSelectMenuOption::new(format!("{} {}", t.emoji(), t.name()), t.key())
        })
        .collect();
    let menu = serenity::CreateSelectMenu::new(
        custom_id(token),
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Select a tool to buy...");

    let embed = serenity::CreateEmbed::new()
        .title("Tool shop")
        .description(lines.join("\n"))
        .color(ECONOMY_COLOR);
    (embed, vec![serenity::CreateActionRow::SelectMenu(menu)])
}

/// The sell menu for the tools a user owns.
#[must_use]
pub fn sell_menu(
    config: &AppConfig,
    token: &interaction_entity::Model,
    owned: &[OwnedTool],
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let lines: Vec<String> = owned
        .iter()
        .map(|o| {
            format!(
                "{} **{}** x{} - sells for {}",
                o.tool.emoji(),
                o.tool.name(),
                o.quantity,
                config.money(o.tool.resale_price())
            )
        })
        .collect();
    let options = owned
        .iter()
        .map(|o| {
            serenity::CreateSelectMenuOption::new(
                format!("{} {}", o.tool.emoji(), o.tool.name()),
                o.tool.key(),
            )
        })
        .collect();
    let menu = serenity::CreateSelectMenu::new(
        custom_id(token),
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Select a tool to sell...");

    let embed = serenity::CreateEmbed::new()
        .title("Sell tools")
        .description(lines.join("\n"))
        .color(ECONOMY_COLOR);
    (embed, vec![serenity::CreateActionRow::SelectMenu(menu)])
}

/// Confirmation after a purchase or sale.
#[must_use]
pub fn receipt_embed(
    config: &AppConfig,
    receipt: &ShopReceipt,
    sold: bool,
) -> serenity::CreateEmbed {
    let verb = if sold { "Sold" } else { "Bought" };
    serenity::CreateEmbed::new()
        .title("Tool shop")
        .description(format!(
            "{verb} {} **{}** for **{}**. You now own {}.",
            receipt.tool.emoji(),
            receipt.tool.name(),
            config.money(receipt.amount),
            receipt.quantity
        ))
        .color(SUCCESS_COLOR)
}

/// First step of the clan wizard.
#[must_use]
pub fn wizard_prompt(
    config: &AppConfig,
    proceed: &interaction_entity::Model,
    cancel: &interaction_entity::Model,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let embed = serenity::CreateEmbed::new()
        .title("Create a clan")
        .description(format!(
            "Creating a clan costs **{}**. Press **Proceed** to pick a name.",
            config.money(config.clan.create_price)
        ))
        .color(ECONOMY_COLOR);
    let buttons = vec![
        serenity::CreateButton::new(custom_id(proceed))
            .label("Proceed")
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(custom_id(cancel))
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary),
    ];
    (embed, vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Name form of the clan wizard.
#[must_use]
pub fn clan_name_modal(prompt: &interaction_entity::Model) -> serenity::CreateModal {
    let input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Short,
        "Clan name",
        CLAN_NAME_INPUT,
    )
    .min_length(3)
    .max_length(32)
    .required(true);
    serenity::CreateModal::new(custom_id(prompt), "Create a clan")
        .components(vec![serenity::CreateActionRow::InputText(input)])
}

/// Clan overview for `/clan info`.
#[must_use]
pub fn clan_embed(config: &AppConfig, summary: &ClanSummary) -> serenity::CreateEmbed {
    let clan = &summary.clan;
    let title = match &clan.settings_abbreviation {
        Some(tag) => format!("[{tag}] {}", clan.name),
        None => clan.name.clone(),
    };
    let leader = summary
        .leader_id
        .as_deref()
        .map_or_else(|| "Nobody".to_string(), |id| format!("<@{id}>"));
    serenity::CreateEmbed::new()
        .title(title)
        .field("Leader", leader, true)
        .field("Members", summary.member_count.to_string(), true)
        .field("Level", clan.level.to_string(), true)
        .field("Earned", config.money(summary.currency_earned), true)
        .color(ECONOMY_COLOR)
}

/// Open challenge with accept and decline buttons.
#[must_use]
pub fn challenge_message(
    config: &AppConfig,
    challenge: &ChallengePayload,
    accept: &interaction_entity::Model,
    decline: &interaction_entity::Model,
) -> (String, Vec<serenity::CreateActionRow>) {
    let mut content = format!(
        "<@{}>, <@{}> challenges you to Connect 4!",
        challenge.opponent_id, challenge.challenger_id
    );
    if challenge.wager > 0 {
        content.push_str(&format!(" Wager: **{}**", config.money(challenge.wager)));
    }
    if let Some(expires) = accept.expires_at {
        content.push_str(&format!("\nExpires <t:{}:R>", expires.timestamp()));
    }
    let buttons = vec![
        serenity::CreateButton::new(custom_id(accept))
            .label("Accept")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(custom_id(decline))
            .label("Decline")
            .style(serenity::ButtonStyle::Danger),
    ];
    (content, vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Board embed. Open games get the column menu and forfeit button.
#[must_use]
pub fn game_message(
    config: &AppConfig,
    game: &Game,
    tokens: Option<&BoardTokens>,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let view = view::describe(game);
    let mut embed = serenity::CreateEmbed::new()
        .title("Connect 4")
        .description(format!("{}\n\n{}", view.description, view.grid))
        .color(view.color);
    if let Some(prize) = view.prize {
        embed = embed.field("Prize", config.money(prize), true);
    }

    let components = match tokens {
        Some(tokens) if view.open => {
            let options = Column::ALL
                .iter()
                .map(|c| serenity::CreateSelectMenuOption::new(format!("Column {c}"), c.value()))
                .collect();
            let menu = serenity::CreateSelectMenu::new(
                custom_id(&tokens.move_token),
                serenity::CreateSelectMenuKind::String { options },
            )
            .placeholder("Drop a disc...");
            let forfeit = serenity::CreateButton::new(custom_id(&tokens.forfeit_token))
                .label("Forfeit")
                .style(serenity::ButtonStyle::Danger);
            vec![
                serenity::CreateActionRow::SelectMenu(menu),
                serenity::CreateActionRow::Buttons(vec![forfeit]),
            ]
        }
        _ => Vec::new(),
    };
    (embed, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::work::ClanBonus;
    use chrono::{TimeZone, Utc};

    fn outcome(uses_left: u64, next_available: Option<chrono::DateTime<Utc>>) -> WorkOutcome {
        WorkOutcome {
            reward: 1_000,
            bonus: ClanBonus {
                multiplier: 0.0,
                amount: 0,
            },
            total: 1_000,
            uses_left,
            next_available,
        }
    }

    #[test]
    fn test_work_footer() {
        assert_eq!(work_footer(&outcome(3, None), "Next fish"), "3 uses left");
        assert_eq!(work_footer(&outcome(1, None), "Next fish"), "1 use left");

        let next = Utc.with_ymd_and_hms(2025, 1, 1, 13, 0, 0).single();
        assert_eq!(
            work_footer(&outcome(0, next), "Next fish"),
            format!("Next fish <t:{}:R>", next.map_or(0, |t| t.timestamp()))
        );
    }

    #[test]
    fn test_payout_mentions_clan_bonus() {
        let config = AppConfig::default();
        assert_eq!(payout_lines(&config, &outcome(1, None)), "You got **$1,000**");

        let with_bonus = WorkOutcome {
            bonus: ClanBonus {
                multiplier: 0.05,
                amount: 50,
            },
            total: 1_050,
            ..outcome(1, None)
        };
        assert_eq!(
            payout_lines(&config, &with_bonus),
            "You got **$1,050** (+$50 clan bonus, 5%)"
        );
    }
}
