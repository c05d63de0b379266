//! Core business logic, independent of Discord.
//!
//! Every operation takes the database connection and the current time as
//! arguments, so the bot layer and the tests drive them the same way.

/// Parsing and formatting of currency amounts
pub mod amount;
/// Clans: names, membership, the creation wizard and leaving
pub mod clan;
/// Connect-4 rules and stored games
pub mod connect4;
/// Single-use tokens behind buttons, select menus and forms
pub mod interaction;
/// Tool shop
pub mod shop;
/// Wallets and balance changes
pub mod wallet;
/// Cooldown-gated earning commands
pub mod work;
