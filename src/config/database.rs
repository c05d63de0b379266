//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models. Composite uniqueness (one wallet per user and guild, one slug per
//! guild, ...) is added as explicit indexes afterwards.

use crate::entities::{
    Clan, ClanBanishment, ClanInvitation, ClanMember, ClanStatistics, Connect4Game, Interaction,
    InventoryItem, Wallet, Work, clan, clan_member, clan_statistics, interaction, inventory_item,
    wallet, work,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/guild_economy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_wallet_owner")
            .table(Wallet)
            .col(wallet::Column::UserDiscordId)
            .col(wallet::Column::GuildId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_clan_slug")
            .table(Clan)
            .col(clan::Column::Slug)
            .col(clan::Column::DiscordGuildId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_clan_member")
            .table(ClanMember)
            .col(clan_member::Column::ClanId)
            .col(clan_member::Column::DiscordUserId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_clan_statistic")
            .table(ClanStatistics)
            .col(clan_statistics::Column::ClanId)
            .col(clan_statistics::Column::Key)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_inventory_slot")
            .table(InventoryItem)
            .col(inventory_item::Column::UserDiscordId)
            .col(inventory_item::Column::GuildId)
            .col(inventory_item::Column::Item)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_work_window")
            .table(Work)
            .col(work::Column::UserDiscordId)
            .col(work::Column::GuildDiscordId)
            .col(work::Column::Kind)
            .col(work::Column::CreatedAt)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_interaction_owner")
            .table(Interaction)
            .col(interaction::Column::UserDiscordId)
            .col(interaction::Column::GuildId)
            .col(interaction::Column::Kind)
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates every table and index the bot needs. Safe to run on every start.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents before children so foreign keys resolve
    create_table(db, &schema, Wallet).await?;
    create_table(db, &schema, Clan).await?;
    create_table(db, &schema, ClanMember).await?;
    create_table(db, &schema, ClanInvitation).await?;
    create_table(db, &schema, ClanBanishment).await?;
    create_table(db, &schema, ClanStatistics).await?;
    create_table(db, &schema, Connect4Game).await?;
    create_table(db, &schema, Work).await?;
    create_table(db, &schema, Interaction).await?;
    create_table(db, &schema, InventoryItem).await?;

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}
