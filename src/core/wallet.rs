//! Economy ledger - Wallet lookup and balance changes.
//!
//! Balances are never read, modified and written back. Every change is a
//! single `UPDATE wallets SET balance = balance + ?` evaluated by the database,
//! and debits carry a `balance >= amount` guard so two concurrent debits can
//! never overdraw a wallet. Functions that only change balances are generic
//! over [`ConnectionTrait`] so callers can run them inside a larger transaction.

use crate::{
    entities::{Wallet, wallet},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};

/// Returns the wallet for a user in a guild, creating an empty one if needed.
///
/// Concurrent first calls may both try to insert; the unique index makes one of
/// them fail, and that caller re-reads the row the other one created.
pub async fn create_wallet<C>(db: &C, user_id: &str, guild_id: &str) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_wallet(db, user_id, guild_id).await? {
        return Ok(existing);
    }

    let new_wallet = wallet::ActiveModel {
        user_discord_id: Set(user_id.to_string()),
        guild_id: Set(guild_id.to_string()),
        balance: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_wallet.insert(db).await {
        Ok(created) => Ok(created),
        Err(insert_err) => find_wallet(db, user_id, guild_id)
            .await?
            .ok_or(Error::Database(insert_err)),
    }
}

/// Finds a wallet without creating it.
pub async fn find_wallet<C>(db: &C, user_id: &str, guild_id: &str) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::UserDiscordId.eq(user_id))
        .filter(wallet::Column::GuildId.eq(guild_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a wallet by its primary key.
pub async fn get_wallet_by_id<C>(db: &C, wallet_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await?
        .ok_or(Error::WalletNotFound { id: wallet_id })
}

/// Adds `amount` to a wallet. Negative amounts are allowed and may take the
/// balance below zero; use [`debit`] when it must not.
///
/// The update only applies while the result still fits in an `i64`, so an
/// oversized credit fails with [`Error::AmountTooLarge`] instead of leaving a
/// value the database can no longer hand back as an integer.
pub async fn credit<C>(db: &C, wallet_id: i64, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let headroom = if amount >= 0 {
        wallet::Column::Balance.lte(i64::MAX - amount)
    } else {
        wallet::Column::Balance.gte(i64::MIN - amount)
    };

    let result = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(amount),
        )
        .filter(wallet::Column::Id.eq(wallet_id))
        .filter(headroom)
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = get_wallet_by_id(db, wallet_id).await?;
        return Err(Error::AmountTooLarge {
            amount,
            maximum: i64::MAX.saturating_sub(current.balance),
        });
    }
    Ok(())
}

/// Removes `amount` from a wallet if, and only if, the balance covers it.
///
/// The balance check and the subtraction are one statement, so the check
/// cannot go stale between reading and writing.
pub async fn debit<C>(db: &C, wallet_id: i64, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if amount < 0 {
        return Err(Error::InvalidAmount {
            input: amount.to_string(),
        });
    }

    let result = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).sub(amount),
        )
        .filter(wallet::Column::Id.eq(wallet_id))
        .filter(wallet::Column::Balance.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = get_wallet_by_id(db, wallet_id).await?;
        return Err(Error::InsufficientFunds {
            balance: current.balance,
            required: amount,
        });
    }
    Ok(())
}

/// Moves `amount` between two wallets in one transaction.
pub async fn transfer(
    db: &DatabaseConnection,
    from_wallet_id: i64,
    to_wallet_id: i64,
    amount: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    debit(&txn, from_wallet_id, amount).await?;
    credit(&txn, to_wallet_id, amount).await?;
    txn.commit().await?;
    Ok(())
}

/// Mints `amount` into a user's wallet (`/spawn`). The increment is
/// relative, so concurrent spawns and gifts are never lost.
pub async fn spawn(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    amount: i64,
) -> Result<wallet::Model> {
    if amount <= 0 {
        return Err(Error::InvalidAmount {
            input: amount.to_string(),
        });
    }

    let txn = db.begin().await?;
    let purse = create_wallet(&txn, user_id, guild_id).await?;
    credit(&txn, purse.id, amount).await?;
    let updated = get_wallet_by_id(&txn, purse.id).await?;
    txn.commit().await?;

    tracing::info!(user = user_id, guild = guild_id, amount, "Money spawned");
    Ok(updated)
}

/// Validates and performs a `/gift`: amount `0` means the whole balance.
///
/// Recipient checks (bots, blocked users) are the caller's job because they
/// need platform data; everything that depends on stored state happens here.
pub async fn gift(
    db: &DatabaseConnection,
    guild_id: &str,
    sender_id: &str,
    recipient_id: &str,
    requested: i64,
    minimum: i64,
) -> Result<GiftReceipt> {
    if sender_id == recipient_id {
        return Err(Error::InvalidRecipient {
            reason: "You can't gift money to yourself.".to_string(),
        });
    }

    let sender = create_wallet(db, sender_id, guild_id).await?;
    let amount = if requested == 0 {
        sender.balance
    } else {
        requested
    };

    if amount < minimum {
        return Err(Error::AmountTooSmall { amount, minimum });
    }
    if sender.balance < amount {
        return Err(Error::InsufficientFunds {
            balance: sender.balance,
            required: amount,
        });
    }

    let recipient = create_wallet(db, recipient_id, guild_id).await?;
    transfer(db, sender.id, recipient.id, amount).await?;

    tracing::info!(
        sender = sender_id,
        recipient = recipient_id,
        guild = guild_id,
        amount,
        "Gift transferred"
    );

    Ok(GiftReceipt { amount })
}

/// Result of a successful gift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftReceipt {
    /// Amount that changed hands
    pub amount: i64,
}
