//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod clan;
pub mod clan_banishment;
pub mod clan_invitation;
pub mod clan_member;
pub mod clan_statistics;
pub mod connect4_game;
pub mod interaction;
pub mod inventory_item;
pub mod wallet;
pub mod work;

// Re-export specific types to avoid conflicts
pub use clan::{Column as ClanColumn, Entity as Clan, Model as ClanModel};
pub use clan_banishment::{Entity as ClanBanishment, Model as ClanBanishmentModel};
pub use clan_invitation::{Entity as ClanInvitation, Model as ClanInvitationModel};
pub use clan_member::{Column as ClanMemberColumn, Entity as ClanMember, Model as ClanMemberModel};
pub use clan_statistics::{Entity as ClanStatistics, Model as ClanStatisticsModel};
pub use connect4_game::{
    Column as Connect4GameColumn, Entity as Connect4Game, Model as Connect4GameModel,
};
pub use interaction::{
    Column as InteractionColumn, Entity as Interaction, Model as InteractionModel,
};
pub use inventory_item::{Entity as InventoryItem, Model as InventoryItemModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
pub use work::{Column as WorkColumn, Entity as Work, Model as WorkModel};
