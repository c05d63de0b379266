//! Tool shop - buying and selling items through select menus.
//!
//! A menu is bound to the wallet it was opened for. Picking an entry consumes
//! the menu's token together with the balance and inventory change.

use crate::{
    core::{
        interaction::{self, NewInteraction, PendingAction, ResolvedInteraction, ShopMenuPayload},
        wallet,
    },
    entities::{InventoryItem, interaction as interaction_entity, inventory_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::instrument;

/// Items sold in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    FishingRod,
    Shovel,
    Axe,
    Pickaxe,
}

impl Tool {
    pub const ALL: [Self; 4] = [Self::FishingRod, Self::Shovel, Self::Axe, Self::Pickaxe];

    /// Inventory key and select menu value.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FishingRod => "FISHING_ROD",
            Self::Shovel => "SHOVEL",
            Self::Axe => "AXE",
            Self::Pickaxe => "PICKAXE",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FishingRod => "Fishing Rod",
            Self::Shovel => "Shovel",
            Self::Axe => "Axe",
            Self::Pickaxe => "Pickaxe",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::FishingRod => "🎣",
            Self::Shovel => "🪏",
            Self::Axe => "🪓",
            Self::Pickaxe => "⛏️",
        }
    }

    /// Purchase price.
    #[must_use]
    pub const fn price(self) -> i64 {
        match self {
            Self::FishingRod => 5_000,
            Self::Shovel => 4_000,
            Self::Axe => 6_000,
            Self::Pickaxe => 7_500,
        }
    }

    /// What the shop pays back: half the price.
    #[must_use]
    pub const fn resale_price(self) -> i64 {
        self.price() / 2
    }

    /// Parses a menu value.
    pub fn from_key(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| Error::UnknownItem {
                item: key.to_string(),
            })
    }
}

/// One inventory line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedTool {
    pub tool: Tool,
    pub quantity: i64,
}

/// Tools a user holds in a guild, in shop order. Unknown keys are skipped.
pub async fn inventory<C>(db: &C, user_id: &str, guild_id: &str) -> Result<Vec<OwnedTool>>
where
    C: ConnectionTrait,
{
    let rows = InventoryItem::find()
        .filter(inventory_item::Column::UserDiscordId.eq(user_id))
        .filter(inventory_item::Column::GuildId.eq(guild_id))
        .filter(inventory_item::Column::Quantity.gt(0))
        .order_by_asc(inventory_item::Column::Id)
        .all(db)
        .await?;

    let mut owned: Vec<OwnedTool> = rows
        .into_iter()
        .filter_map(|row| {
            Tool::from_key(&row.item).ok().map(|tool| OwnedTool {
                tool,
                quantity: row.quantity,
            })
        })
        .collect();
    owned.sort_by_key(|o| Tool::ALL.iter().position(|t| *t == o.tool));
    Ok(owned)
}

async fn add_item<C>(db: &C, user_id: &str, guild_id: &str, tool: Tool) -> Result<i64>
where
    C: ConnectionTrait,
{
    let slot = || {
        InventoryItem::find()
            .filter(inventory_item::Column::UserDiscordId.eq(user_id))
            .filter(inventory_item::Column::GuildId.eq(guild_id))
            .filter(inventory_item::Column::Item.eq(tool.key()))
    };

    let updated = InventoryItem::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(1),
        )
        .filter(inventory_item::Column::UserDiscordId.eq(user_id))
        .filter(inventory_item::Column::GuildId.eq(guild_id))
        .filter(inventory_item::Column::Item.eq(tool.key()))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        inventory_item::ActiveModel {
            user_discord_id: Set(user_id.to_string()),
            guild_id: Set(guild_id.to_string()),
            item: Set(tool.key().to_string()),
            quantity: Set(1),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(slot().one(db).await?.map_or(0, |row| row.quantity))
}

async fn remove_item<C>(db: &C, user_id: &str, guild_id: &str, tool: Tool) -> Result<()>
where
    C: ConnectionTrait,
{
    let updated = InventoryItem::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).sub(1),
        )
        .filter(inventory_item::Column::UserDiscordId.eq(user_id))
        .filter(inventory_item::Column::GuildId.eq(guild_id))
        .filter(inventory_item::Column::Item.eq(tool.key()))
        .filter(inventory_item::Column::Quantity.gte(1))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::ItemNotOwned {
            item: tool.name().to_string(),
        });
    }
    Ok(())
}

/// Issues the token behind a shop menu for the user's wallet.
pub async fn open_menu(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    selling: bool,
    now: DateTime<Utc>,
) -> Result<interaction_entity::Model> {
    let purse = wallet::create_wallet(db, user_id, guild_id).await?;
    let payload = ShopMenuPayload { wallet_id: purse.id };
    let action = if selling {
        PendingAction::ShopSellToolMenu(payload)
    } else {
        PendingAction::ShopBuyToolMenu(payload)
    };
    interaction::issue(
        db,
        NewInteraction {
            guild_id,
            user_id,
            channel_id: None,
            action,
            expires_at: None,
        },
        now,
    )
    .await
}

/// A completed purchase or sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopReceipt {
    pub tool: Tool,
    pub amount: i64,
    /// Quantity held afterwards.
    pub quantity: i64,
}

fn menu_wallet(resolved: &ResolvedInteraction, selling: bool) -> Result<i64> {
    match (&resolved.action, selling) {
        (PendingAction::ShopBuyToolMenu(p), false) | (PendingAction::ShopSellToolMenu(p), true) => {
            Ok(p.wallet_id)
        }
        _ => Err(Error::WrongInteractionType {
            expected: if selling { "the sell menu" } else { "the buy menu" }.to_string(),
        }),
    }
}

/// Buys one `raw_item` from the buy menu.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn buy_tool(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    user_id: &str,
    guild_id: &str,
    raw_item: &str,
    now: DateTime<Utc>,
) -> Result<ShopReceipt> {
    let wallet_id = menu_wallet(resolved, false)?;
    resolved.ensure_usable_by(user_id, guild_id, now)?;
    let tool = Tool::from_key(raw_item)?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    wallet::debit(&txn, wallet_id, tool.price()).await?;
    let quantity = add_item(&txn, user_id, guild_id, tool).await?;
    txn.commit().await?;

    tracing::info!(user = user_id, guild = guild_id, item = tool.key(), "Tool bought");
    Ok(ShopReceipt {
        tool,
        amount: tool.price(),
        quantity,
    })
}

/// Sells one `raw_item` back from the sell menu.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn sell_tool(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    user_id: &str,
    guild_id: &str,
    raw_item: &str,
    now: DateTime<Utc>,
) -> Result<ShopReceipt> {
    let wallet_id = menu_wallet(resolved, true)?;
    resolved.ensure_usable_by(user_id, guild_id, now)?;
    let tool = Tool::from_key(raw_item)?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    remove_item(&txn, user_id, guild_id, tool).await?;
    wallet::credit(&txn, wallet_id, tool.resale_price()).await?;
    txn.commit().await?;

    let quantity = inventory(db, user_id, guild_id)
        .await?
        .into_iter()
        .find(|o| o.tool == tool)
        .map_or(0, |o| o.quantity);

    tracing::info!(user = user_id, guild = guild_id, item = tool.key(), "Tool sold");
    Ok(ShopReceipt {
        tool,
        amount: tool.resale_price(),
        quantity,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    async fn menu(
        db: &DatabaseConnection,
        user: &str,
        selling: bool,
    ) -> Result<ResolvedInteraction> {
        let token = open_menu(db, user, TEST_GUILD, selling, Utc::now()).await?;
        interaction::resolve(db, &token.id.to_string()).await
    }

    #[test]
    fn test_tool_keys() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_key(tool.key()).unwrap(), tool);
            assert_eq!(tool.resale_price() * 2, tool.price());
        }
        assert!(matches!(
            Tool::from_key("LASER"),
            Err(Error::UnknownItem { .. })
        ));
    }

    #[tokio::test]
    async fn test_buy_then_sell() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, "shopper", TEST_GUILD, 20_000).await?;

        let buy = menu(&db, "shopper", false).await?;
        let receipt = buy_tool(&db, &buy, "shopper", TEST_GUILD, "FISHING_ROD", Utc::now()).await?;
        assert_eq!(receipt.amount, 5_000);
        assert_eq!(receipt.quantity, 1);

        let buy = menu(&db, "shopper", false).await?;
        let receipt = buy_tool(&db, &buy, "shopper", TEST_GUILD, "FISHING_ROD", Utc::now()).await?;
        assert_eq!(receipt.quantity, 2);
        assert_eq!(balance_of(&db, "shopper").await?, 10_000);

        let sell = menu(&db, "shopper", true).await?;
        let receipt =
            sell_tool(&db, &sell, "shopper", TEST_GUILD, "FISHING_ROD", Utc::now()).await?;
        assert_eq!(receipt.amount, 2_500);
        assert_eq!(receipt.quantity, 1);
        assert_eq!(balance_of(&db, "shopper").await?, 12_500);

        let owned = inventory(&db, "shopper", TEST_GUILD).await?;
        assert_eq!(
            owned,
            vec![OwnedTool {
                tool: Tool::FishingRod,
                quantity: 1
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_is_single_use() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, "shopper", TEST_GUILD, 20_000).await?;
        let buy = menu(&db, "shopper", false).await?;

        buy_tool(&db, &buy, "shopper", TEST_GUILD, "AXE", Utc::now()).await?;
        assert!(matches!(
            buy_tool(&db, &buy, "shopper", TEST_GUILD, "AXE", Utc::now()).await,
            Err(Error::InteractionConsumed { .. })
        ));
        assert_eq!(balance_of(&db, "shopper").await?, 14_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_buy_without_funds_keeps_menu() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, "shopper", TEST_GUILD, 1_000).await?;
        let buy = menu(&db, "shopper", false).await?;

        assert!(matches!(
            buy_tool(&db, &buy, "shopper", TEST_GUILD, "PICKAXE", Utc::now()).await,
            Err(Error::InsufficientFunds { .. })
        ));
        assert!(inventory(&db, "shopper", TEST_GUILD).await?.is_empty());
        let buy = interaction::resolve(&db, &buy.id().to_string()).await?;
        buy.ensure_usable(Utc::now())?;
        Ok(())
    }

    #[tokio::test]
    async fn test_sell_unowned_tool() -> Result<()> {
        let db = setup_test_db().await?;
        let sell = menu(&db, "shopper", true).await?;
        assert!(matches!(
            sell_tool(&db, &sell, "shopper", TEST_GUILD, "SHOVEL", Utc::now()).await,
            Err(Error::ItemNotOwned { .. })
        ));
        assert_eq!(balance_of(&db, "shopper").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_kind_and_owner_checks() -> Result<()> {
        let db = setup_test_db().await?;
        let sell = menu(&db, "shopper", true).await?;
        assert!(matches!(
            buy_tool(&db, &sell, "shopper", TEST_GUILD, "AXE", Utc::now()).await,
            Err(Error::WrongInteractionType { .. })
        ));

        let buy = menu(&db, "shopper", false).await?;
        assert!(matches!(
            buy_tool(&db, &buy, "thief", TEST_GUILD, "AXE", Utc::now()).await,
            Err(Error::NotYourInteraction)
        ));
        Ok(())
    }
}
