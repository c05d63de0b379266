//! Stored Connect-4 games: challenge, accept, move, forfeit, timeout, payout.
//!
//! Every state change writes the new board with an update filtered on the old
//! board text, so two moves computed from the same snapshot cannot both land.
//! The board update, token consumption and payout share one transaction.

use super::{
    board::{Board, Color, Column},
    engine,
    turn::{Seats, TurnCheck, check_turn},
};
use crate::{
    core::{
        interaction::{
            self, CONNECT4_CHALLENGE_KINDS, CONNECT4_GAME_KINDS, ChallengePayload, GamePayload,
            NewInteraction, PendingAction, ResolvedInteraction,
        },
        wallet,
    },
    entities::{Connect4Game, connect4_game, interaction as interaction_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    Condition, DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::instrument;

/// A stored game with its board decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub model: connect4_game::Model,
    pub board: Board,
    pub seats: Seats,
}

impl Game {
    /// Decodes the board and colors of a stored row.
    pub fn from_model(model: connect4_game::Model) -> Result<Self> {
        let board = Board::from_json(&model.board)?;
        let challenger_color: Color = model.challenger_color.parse()?;
        let seats = Seats {
            challenger: model.challenger.clone(),
            opponent: model.opponent.clone(),
            challenger_color,
        };
        Ok(Self {
            model,
            board,
            seats,
        })
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.model.id
    }

    /// Moment the player on turn runs out of time.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.model.last_move_at + Duration::seconds(self.model.move_time)
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.board.game_state.is_terminal()
    }

    /// Still running but past its deadline.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_over() && now > self.deadline()
    }

    /// What the winner takes home.
    #[must_use]
    pub const fn prize(&self) -> i64 {
        self.model.wager_amount * 2
    }

    /// User id of the winner, for decisive results.
    #[must_use]
    pub fn winner_id(&self) -> Option<&str> {
        self.board
            .game_state
            .winner()
            .map(|color| self.seats.player_of(color))
    }
}

/// Loads a game by id.
pub async fn get_game<C>(db: &C, game_id: i64) -> Result<Game>
where
    C: ConnectionTrait,
{
    let model = Connect4Game::find_by_id(game_id)
        .one(db)
        .await?
        .ok_or(Error::GameNotFound { id: game_id })?;
    Game::from_model(model)
}

/// The most recent game in a guild that `user_id` played in.
pub async fn find_latest_game<C>(db: &C, guild_id: &str, user_id: &str) -> Result<Option<Game>>
where
    C: ConnectionTrait,
{
    Connect4Game::find()
        .filter(connect4_game::Column::GuildId.eq(guild_id))
        .filter(
            Condition::any()
                .add(connect4_game::Column::Challenger.eq(user_id))
                .add(connect4_game::Column::Opponent.eq(user_id)),
        )
        .order_by_desc(connect4_game::Column::CreatedAt)
        .order_by_desc(connect4_game::Column::Id)
        .one(db)
        .await?
        .map(Game::from_model)
        .transpose()
}

/// A challenge about to be issued.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeRequest<'a> {
    pub guild_id: &'a str,
    pub channel_id: &'a str,
    pub challenger_id: &'a str,
    pub opponent_id: &'a str,
    pub wager: i64,
}

/// Accept and decline buttons of a challenge, both addressed to the opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTokens {
    pub payload: ChallengePayload,
    pub accept: interaction_entity::Model,
    pub decline: interaction_entity::Model,
}

/// Validates a challenge and issues its buttons. No money moves until the
/// opponent accepts.
#[instrument(skip(db))]
pub async fn issue_challenge(
    db: &DatabaseConnection,
    request: ChallengeRequest<'_>,
    max_wager: i64,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<ChallengeTokens> {
    if request.challenger_id == request.opponent_id {
        return Err(Error::InvalidRecipient {
            reason: "You can't challenge yourself.".to_string(),
        });
    }
    if request.wager < 0 {
        return Err(Error::InvalidAmount {
            input: request.wager.to_string(),
        });
    }
    if request.wager > max_wager {
        return Err(Error::AmountTooLarge {
            amount: request.wager,
            maximum: max_wager,
        });
    }

    let challenger = wallet::create_wallet(db, request.challenger_id, request.guild_id).await?;
    if challenger.balance < request.wager {
        return Err(Error::InsufficientFunds {
            balance: challenger.balance,
            required: request.wager,
        });
    }

    let payload = ChallengePayload {
        challenge_key: format!("{:016x}", rand::random::<u64>()),
        challenger_id: request.challenger_id.to_string(),
        opponent_id: request.opponent_id.to_string(),
        wager: request.wager,
    };
    let token = |action| NewInteraction {
        guild_id: request.guild_id,
        user_id: request.opponent_id,
        channel_id: Some(request.channel_id),
        action,
        expires_at: Some(now + Duration::seconds(ttl_secs)),
    };

    let txn = db.begin().await?;
    let accept = interaction::issue(
        &txn,
        token(PendingAction::Connect4Accept(payload.clone())),
        now,
    )
    .await?;
    let decline = interaction::issue(
        &txn,
        token(PendingAction::Connect4Decline(payload.clone())),
        now,
    )
    .await?;
    txn.commit().await?;

    Ok(ChallengeTokens {
        payload,
        accept,
        decline,
    })
}

fn challenge_payload(resolved: &ResolvedInteraction) -> Result<&ChallengePayload> {
    match &resolved.action {
        PendingAction::Connect4Accept(p) | PendingAction::Connect4Decline(p) => Ok(p),
        _ => Err(Error::WrongInteractionType {
            expected: "a challenge button".to_string(),
        }),
    }
}

/// Starts the game: both wagers are taken and both challenge buttons retired
/// in one transaction. A failed debit leaves the buttons usable.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn accept_challenge(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    actor_id: &str,
    guild_id: &str,
    channel_id: &str,
    move_time_secs: i64,
    challenger_color: Color,
    now: DateTime<Utc>,
) -> Result<Game> {
    let challenge = challenge_payload(resolved)?;
    resolved.ensure_usable_by(actor_id, guild_id, now)?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    interaction::consume_kinds_for_payload(
        &txn,
        &CONNECT4_CHALLENGE_KINDS,
        &resolved.action,
        now,
    )
    .await?;

    if challenge.wager > 0 {
        for player in [&challenge.challenger_id, &challenge.opponent_id] {
            let stake = wallet::create_wallet(&txn, player, guild_id).await?;
            wallet::debit(&txn, stake.id, challenge.wager).await?;
        }
    }

    let board = Board::new();
    let model = connect4_game::ActiveModel {
        guild_id: Set(guild_id.to_string()),
        channel_id: Set(channel_id.to_string()),
        challenger: Set(challenge.challenger_id.clone()),
        opponent: Set(challenge.opponent_id.clone()),
        challenger_color: Set(challenger_color.as_str().to_string()),
        board: Set(board.to_json()?),
        game_state: Set(board.game_state.as_str().to_string()),
        wager_amount: Set(challenge.wager),
        move_time: Set(move_time_secs),
        last_move_at: Set(now),
        created_at: Set(now),
        ended_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        game = model.id,
        challenger = %model.challenger,
        opponent = %model.opponent,
        wager = model.wager_amount,
        "Connect-4 game started"
    );
    Game::from_model(model)
}

/// Retires both challenge buttons without starting a game.
pub async fn decline_challenge(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    actor_id: &str,
    guild_id: &str,
    now: DateTime<Utc>,
) -> Result<ChallengePayload> {
    let challenge = challenge_payload(resolved)?.clone();
    resolved.ensure_usable_by(actor_id, guild_id, now)?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    interaction::consume_kinds_for_payload(
        &txn,
        &CONNECT4_CHALLENGE_KINDS,
        &resolved.action,
        now,
    )
    .await?;
    txn.commit().await?;
    Ok(challenge)
}

/// Column menu and forfeit button for the current board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardTokens {
    pub move_token: interaction_entity::Model,
    pub forfeit_token: interaction_entity::Model,
}

/// Issues fresh board components. Tokens of earlier displays stay valid until
/// the next state change retires them all.
pub async fn issue_board_tokens(
    db: &DatabaseConnection,
    game: &Game,
    now: DateTime<Utc>,
) -> Result<BoardTokens> {
    let payload = GamePayload { game_id: game.id() };
    let token = |action| NewInteraction {
        guild_id: &game.model.guild_id,
        user_id: &game.model.challenger,
        channel_id: Some(&game.model.channel_id),
        action,
        expires_at: None,
    };

    let txn = db.begin().await?;
    let move_token =
        interaction::issue(&txn, token(PendingAction::Connect4Move(payload)), now).await?;
    let forfeit_token =
        interaction::issue(&txn, token(PendingAction::Connect4Forfeit(payload)), now).await?;
    txn.commit().await?;

    Ok(BoardTokens {
        move_token,
        forfeit_token,
    })
}

/// Result of a column pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The pick came from someone not on turn; nothing was stored.
    Suggested { game: Game, column: Column },
    /// The game changed: a move landed, or the player on turn had already
    /// run out of time.
    Updated(Game),
}

/// Handles a pick from a game's column menu.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn submit_move(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    actor_id: &str,
    guild_id: &str,
    raw_column: &str,
    now: DateTime<Utc>,
) -> Result<MoveOutcome> {
    let PendingAction::Connect4Move(payload) = &resolved.action else {
        return Err(Error::WrongInteractionType {
            expected: "a column menu".to_string(),
        });
    };
    resolved.ensure_guild(guild_id)?;
    resolved.ensure_usable(now)?;

    let game = get_game(db, payload.game_id).await?;
    if game.is_over() {
        return Err(Error::GameEnded);
    }
    if game.is_overdue(now) {
        return settle_timeout(db, game, now).await.map(MoveOutcome::Updated);
    }

    let column = Column::from_value(raw_column)?;
    match check_turn(&game.seats, actor_id, game.board.game_state) {
        TurnCheck::Suggest => {
            engine::check_column(&game.board, column)?;
            Ok(MoveOutcome::Suggested { game, column })
        }
        TurnCheck::Move(_) => {
            let next = engine::play(&game.board, column)?;
            commit_board(db, &game, next, now, true)
                .await
                .map(MoveOutcome::Updated)
        }
    }
}

/// Handles the forfeit button: the acting player's color concedes.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn forfeit_game(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    actor_id: &str,
    guild_id: &str,
    now: DateTime<Utc>,
) -> Result<Game> {
    let PendingAction::Connect4Forfeit(payload) = &resolved.action else {
        return Err(Error::WrongInteractionType {
            expected: "a forfeit button".to_string(),
        });
    };
    resolved.ensure_guild(guild_id)?;
    resolved.ensure_usable(now)?;

    let game = get_game(db, payload.game_id).await?;
    let loser = game.seats.require_color(actor_id)?;
    if game.is_over() {
        return Err(Error::GameEnded);
    }
    if game.is_overdue(now) {
        return settle_timeout(db, game, now).await;
    }

    let next = engine::forfeit(&game.board, loser)?;
    commit_board(db, &game, next, now, false).await
}

/// Ends a game whose player on turn let the deadline pass. Games that are
/// over or still in time are returned unchanged.
pub async fn settle_timeout(
    db: &DatabaseConnection,
    game: Game,
    now: DateTime<Utc>,
) -> Result<Game> {
    if !game.is_overdue(now) {
        return Ok(game);
    }
    let next = engine::time_out(&game.board)?;
    commit_board(db, &game, next, now, false).await
}

async fn commit_board(
    db: &DatabaseConnection,
    game: &Game,
    next: Board,
    now: DateTime<Utc>,
    disc_dropped: bool,
) -> Result<Game> {
    let ended_at = next.game_state.is_terminal().then_some(now);
    let mut update = Connect4Game::update_many()
        .col_expr(connect4_game::Column::Board, Expr::value(next.to_json()?))
        .col_expr(
            connect4_game::Column::GameState,
            Expr::value(next.game_state.as_str()),
        )
        .col_expr(connect4_game::Column::EndedAt, Expr::value(ended_at))
        .filter(connect4_game::Column::Id.eq(game.id()))
        .filter(connect4_game::Column::Board.eq(game.model.board.as_str()));
    if disc_dropped {
        update = update.col_expr(connect4_game::Column::LastMoveAt, Expr::value(now));
    }

    let txn = db.begin().await?;
    if update.exec(&txn).await?.rows_affected == 0 {
        return Err(Error::StaleGame { id: game.id() });
    }
    interaction::consume_kinds_for_payload(
        &txn,
        &CONNECT4_GAME_KINDS,
        &PendingAction::Connect4Move(GamePayload { game_id: game.id() }),
        now,
    )
    .await?;
    if next.game_state.is_terminal() {
        payout(&txn, game, &next).await?;
    }
    txn.commit().await?;

    tracing::debug!(
        game = game.id(),
        state = next.game_state.as_str(),
        "Connect-4 board updated"
    );
    get_game(db, game.id()).await
}

/// Pays a finished game: the winner takes both stakes, a draw returns each.
async fn payout<C>(txn: &C, game: &Game, board: &Board) -> Result<()>
where
    C: ConnectionTrait,
{
    let wager = game.model.wager_amount;
    if wager == 0 {
        return Ok(());
    }
    let guild_id = &game.model.guild_id;

    if let Some(color) = board.game_state.winner() {
        let winner = game.seats.player_of(color);
        let purse = wallet::create_wallet(txn, winner, guild_id).await?;
        wallet::credit(txn, purse.id, wager * 2).await?;
        tracing::info!(game = game.id(), winner, prize = wager * 2, "Connect-4 prize paid");
    } else {
        for player in [&game.seats.challenger, &game.seats.opponent] {
            let purse = wallet::create_wallet(txn, player, guild_id).await?;
            wallet::credit(txn, purse.id, wager).await?;
        }
        tracing::info!(game = game.id(), "Connect-4 draw, wagers refunded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::connect4::{GameState, Slot};
    use crate::test_utils::*;

    async fn move_token(db: &DatabaseConnection, game: &Game) -> Result<ResolvedInteraction> {
        let tokens = issue_board_tokens(db, game, Utc::now()).await?;
        interaction::resolve(db, &tokens.move_token.id.to_string()).await
    }

    async fn forfeit_token(db: &DatabaseConnection, game: &Game) -> Result<ResolvedInteraction> {
        let tokens = issue_board_tokens(db, game, Utc::now()).await?;
        interaction::resolve(db, &tokens.forfeit_token.id.to_string()).await
    }

    async fn play_move(
        db: &DatabaseConnection,
        game: &Game,
        actor: &str,
        column: &str,
    ) -> Result<MoveOutcome> {
        let token = move_token(db, game).await?;
        submit_move(db, &token, actor, TEST_GUILD, column, Utc::now()).await
    }

    fn updated(outcome: MoveOutcome) -> Game {
        match outcome {
            MoveOutcome::Updated(game) => game,
            MoveOutcome::Suggested { .. } => panic!("expected the move to land"),
        }
    }

    #[tokio::test]
    async fn test_accept_takes_both_wagers() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 1_000, Color::Red).await?;

        assert_eq!(game.board, Board::new());
        assert_eq!(game.model.wager_amount, 1_000);
        assert_eq!(balance_of(&db, CHALLENGER).await?, TEST_FUNDS - 1_000);
        assert_eq!(balance_of(&db, OPPONENT).await?, TEST_FUNDS - 1_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_accept_twice_is_already_handled() -> Result<()> {
        let db = setup_test_db().await?;
        let tokens = issue_test_challenge(&db, 500).await?;
        let accept = interaction::resolve(&db, &tokens.accept.id.to_string()).await?;
        let now = Utc::now();

        accept_challenge(
            &db,
            &accept,
            OPPONENT,
            TEST_GUILD,
            TEST_CHANNEL,
            300,
            Color::Red,
            now,
        )
        .await?;
        let again = accept_challenge(
            &db,
            &accept,
            OPPONENT,
            TEST_GUILD,
            TEST_CHANNEL,
            300,
            Color::Red,
            now,
        )
        .await;
        assert!(matches!(again, Err(Error::InteractionConsumed { .. })));

        // The sibling decline button was retired with the accept
        let decline = interaction::resolve(&db, &tokens.decline.id.to_string()).await?;
        assert!(decline.record.consumed_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_accept_without_funds_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, CHALLENGER, TEST_GUILD, 5_000).await?;
        let request = ChallengeRequest {
            guild_id: TEST_GUILD,
            channel_id: TEST_CHANNEL,
            challenger_id: CHALLENGER,
            opponent_id: OPPONENT,
            wager: 2_000,
        };
        let tokens = issue_challenge(&db, request, 10_000, 600, Utc::now()).await?;
        let accept = interaction::resolve(&db, &tokens.accept.id.to_string()).await?;

        let result = accept_challenge(
            &db, &accept, OPPONENT, TEST_GUILD, TEST_CHANNEL, 300, Color::Red, Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));

        // Nothing stuck: challenger keeps the stake and the button still works
        assert_eq!(balance_of(&db, CHALLENGER).await?, 5_000);
        let accept = interaction::resolve(&db, &tokens.accept.id.to_string()).await?;
        assert!(accept.record.consumed_at.is_none());
        assert!(find_latest_game(&db, TEST_GUILD, CHALLENGER).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_challenge_validation() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, CHALLENGER, TEST_GUILD, 100).await?;
        let mut request = ChallengeRequest {
            guild_id: TEST_GUILD,
            channel_id: TEST_CHANNEL,
            challenger_id: CHALLENGER,
            opponent_id: CHALLENGER,
            wager: 0,
        };
        assert!(matches!(
            issue_challenge(&db, request, 1_000, 600, Utc::now()).await,
            Err(Error::InvalidRecipient { .. })
        ));

        request.opponent_id = OPPONENT;
        request.wager = 5_000;
        assert!(matches!(
            issue_challenge(&db, request, 1_000, 600, Utc::now()).await,
            Err(Error::AmountTooLarge { .. })
        ));

        request.wager = 500;
        assert!(matches!(
            issue_challenge(&db, request, 1_000, 600, Utc::now()).await,
            Err(Error::InsufficientFunds { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_decline_retires_both_buttons() -> Result<()> {
        let db = setup_test_db().await?;
        let tokens = issue_test_challenge(&db, 0).await?;
        let decline = interaction::resolve(&db, &tokens.decline.id.to_string()).await?;

        let challenge = decline_challenge(&db, &decline, OPPONENT, TEST_GUILD, Utc::now()).await?;
        assert_eq!(challenge.challenger_id, CHALLENGER);

        let accept = interaction::resolve(&db, &tokens.accept.id.to_string()).await?;
        assert!(matches!(
            accept.ensure_usable(Utc::now()),
            Err(Error::InteractionConsumed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_identical_challenges_are_independent() -> Result<()> {
        let db = setup_test_db().await?;
        let first = issue_test_challenge(&db, 100).await?;
        let second = issue_test_challenge(&db, 100).await?;
        assert_ne!(first.payload.challenge_key, second.payload.challenge_key);

        let accept = interaction::resolve(&db, &first.accept.id.to_string()).await?;
        accept_challenge(
            &db,
            &accept,
            OPPONENT,
            TEST_GUILD,
            TEST_CHANNEL,
            300,
            Color::Red,
            Utc::now(),
        )
        .await?;

        for token in [&second.accept, &second.decline] {
            let open = interaction::resolve(&db, &token.id.to_string()).await?;
            assert!(open.record.consumed_at.is_none());
        }
        let accept = interaction::resolve(&db, &second.accept.id.to_string()).await?;
        accept_challenge(
            &db,
            &accept,
            OPPONENT,
            TEST_GUILD,
            TEST_CHANNEL,
            300,
            Color::Red,
            Utc::now(),
        )
        .await?;

        // Declining a third copy leaves nothing else behind either
        let third = issue_test_challenge(&db, 100).await?;
        let fourth = issue_test_challenge(&db, 100).await?;
        let decline = interaction::resolve(&db, &third.decline.id.to_string()).await?;
        decline_challenge(&db, &decline, OPPONENT, TEST_GUILD, Utc::now()).await?;
        let untouched = interaction::resolve(&db, &fourth.accept.id.to_string()).await?;
        assert!(untouched.record.consumed_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_opponent_may_accept() -> Result<()> {
        let db = setup_test_db().await?;
        let tokens = issue_test_challenge(&db, 0).await?;
        let accept = interaction::resolve(&db, &tokens.accept.id.to_string()).await?;
        let result = accept_challenge(
            &db, &accept, CHALLENGER, TEST_GUILD, TEST_CHANNEL, 300, Color::Red, Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotYourInteraction)));
        Ok(())
    }

    #[tokio::test]
    async fn test_red_first_move_in_column_three() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;

        let game = updated(play_move(&db, &game, CHALLENGER, "3").await?);
        assert_eq!(game.board.slot(2, 0), Slot::Red);
        assert_eq!(game.board.column_height(Column::Three), 1);
        assert_eq!(game.board.moves_played(), 1);
        assert_eq!(game.board.game_state, GameState::YellowTurn);
        assert_eq!(game.model.game_state, "YELLOW_TURN");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_turn_holders_only_suggest() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;

        // Yellow waiting for its turn
        let outcome = play_move(&db, &game, OPPONENT, "4").await?;
        assert!(matches!(
            outcome,
            MoveOutcome::Suggested {
                column: Column::Four,
                ..
            }
        ));

        // Spectator
        let outcome = play_move(&db, &game, "spectator", "5").await?;
        assert!(matches!(outcome, MoveOutcome::Suggested { .. }));

        let stored = get_game(&db, game.id()).await?;
        assert_eq!(stored.board, Board::new());
        Ok(())
    }

    #[tokio::test]
    async fn test_move_retires_board_tokens() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;
        let token = move_token(&db, &game).await?;

        submit_move(&db, &token, CHALLENGER, TEST_GUILD, "1", Utc::now()).await?;
        let stale = interaction::resolve(&db, &token.id().to_string()).await?;
        let result = submit_move(&db, &stale, OPPONENT, TEST_GUILD, "1", Utc::now()).await;
        assert!(matches!(result, Err(Error::InteractionConsumed { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_column_value() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;
        assert!(matches!(
            play_move(&db, &game, CHALLENGER, "9").await,
            Err(Error::InvalidColumn { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_win_pays_prize() -> Result<()> {
        let db = setup_test_db().await?;
        // Challenger plays yellow, so the opponent (red) opens
        let mut game = start_test_game(&db, 1_000, Color::Yellow).await?;

        for (actor, column) in [
            (OPPONENT, "1"),
            (CHALLENGER, "2"),
            (OPPONENT, "1"),
            (CHALLENGER, "2"),
            (OPPONENT, "1"),
            (CHALLENGER, "2"),
            (OPPONENT, "1"),
        ] {
            game = updated(play_move(&db, &game, actor, column).await?);
        }

        assert_eq!(game.board.game_state, GameState::RedWin);
        assert_eq!(game.winner_id(), Some(OPPONENT));
        assert!(game.model.ended_at.is_some());
        assert_eq!(balance_of(&db, OPPONENT).await?, TEST_FUNDS + 1_000);
        assert_eq!(balance_of(&db, CHALLENGER).await?, TEST_FUNDS - 1_000);

        assert!(matches!(
            play_move(&db, &game, CHALLENGER, "3").await,
            Err(Error::GameEnded)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_forfeit_pays_other_player() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 2_000, Color::Red).await?;

        let token = forfeit_token(&db, &game).await?;
        let game = forfeit_game(&db, &token, CHALLENGER, TEST_GUILD, Utc::now()).await?;

        assert_eq!(game.board.forfeit_state, Some(Color::Red));
        assert_eq!(game.board.game_state, GameState::YellowWin);
        assert_eq!(game.winner_id(), Some(OPPONENT));
        assert_eq!(balance_of(&db, OPPONENT).await?, TEST_FUNDS + 2_000);
        assert_eq!(balance_of(&db, CHALLENGER).await?, TEST_FUNDS - 2_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_forfeit_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;

        let token = forfeit_token(&db, &game).await?;
        assert!(matches!(
            forfeit_game(&db, &token, "spectator", TEST_GUILD, Utc::now()).await,
            Err(Error::NotAPlayer)
        ));

        let game = forfeit_game(&db, &token, OPPONENT, TEST_GUILD, Utc::now()).await?;
        assert_eq!(game.board.game_state, GameState::RedWin);

        let token = forfeit_token(&db, &game).await?;
        assert!(matches!(
            forfeit_game(&db, &token, CHALLENGER, TEST_GUILD, Utc::now()).await,
            Err(Error::GameEnded)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_is_settled_on_touch() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 1_500, Color::Red).await?;

        // Red is on turn and lets the clock run out
        let later = game.deadline() + Duration::seconds(1);
        assert!(game.is_overdue(later));
        let settled = settle_timeout(&db, get_game(&db, game.id()).await?, later).await?;

        assert_eq!(settled.board.out_of_time, Some(Color::Red));
        assert_eq!(settled.board.game_state, GameState::YellowWin);
        assert_eq!(balance_of(&db, OPPONENT).await?, TEST_FUNDS + 1_500);

        // Settling again changes nothing
        let again = settle_timeout(&db, get_game(&db, game.id()).await?, later).await?;
        assert_eq!(again, settled);
        Ok(())
    }

    #[tokio::test]
    async fn test_move_after_deadline_times_out() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;
        let token = move_token(&db, &game).await?;

        let later = game.deadline() + Duration::seconds(30);
        let outcome = submit_move(&db, &token, CHALLENGER, TEST_GUILD, "1", later).await?;
        let game = updated(outcome);
        assert_eq!(game.board.out_of_time, Some(Color::Red));
        assert_eq!(game.board.moves_played(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_draw_refunds_both() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 700, Color::Red).await?;

        let mut drawn = game.board.clone();
        drawn.game_state = GameState::Draw;
        let game = commit_board(&db, &game, drawn, Utc::now(), false).await?;

        assert_eq!(game.winner_id(), None);
        assert_eq!(balance_of(&db, CHALLENGER).await?, TEST_FUNDS);
        assert_eq!(balance_of(&db, OPPONENT).await?, TEST_FUNDS);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let game = start_test_game(&db, 0, Color::Red).await?;

        let first = engine::play(&game.board, Column::One)?;
        let second = engine::play(&game.board, Column::Two)?;
        commit_board(&db, &game, first, Utc::now(), true).await?;
        assert!(matches!(
            commit_board(&db, &game, second, Utc::now(), true).await,
            Err(Error::StaleGame { .. })
        ));

        let stored = get_game(&db, game.id()).await?;
        assert_eq!(stored.board.column_height(Column::One), 1);
        assert_eq!(stored.board.column_height(Column::Two), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_latest_game() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(find_latest_game(&db, TEST_GUILD, OPPONENT).await?.is_none());

        let first = start_test_game(&db, 0, Color::Red).await?;
        let second = start_test_game(&db, 0, Color::Yellow).await?;
        assert_ne!(first.id(), second.id());

        let latest = find_latest_game(&db, TEST_GUILD, OPPONENT).await?.unwrap();
        assert_eq!(latest.id(), second.id());
        assert!(find_latest_game(&db, "guild2", OPPONENT).await?.is_none());
        Ok(())
    }
}
