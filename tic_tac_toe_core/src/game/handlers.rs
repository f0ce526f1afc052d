use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::models::{Board, BoardOutcome, Marker};
use super::session::Session;
use crate::error::IllegalMove;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win { winner: Marker, name: String },
    Draw,
    ForcedEnd,
}

/// What a successfully applied move did to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResolution {
    /// Game goes on; `next` now holds the turn.
    Continue { next: Marker },
    /// Game is over. The live board has already been cleared, so the
    /// position that ended it is handed back as `final_board`.
    Finished {
        outcome: GameOutcome,
        final_board: Board,
    },
}

/// Applies a move and settles the game: win is checked before draw, the
/// result is recorded exactly once, and the turn only flips when play
/// continues. On `Err` nothing has changed.
pub fn handle_move(
    board: &mut Board,
    session: &mut Session,
    row: usize,
    col: usize,
    mover: Marker,
) -> Result<MoveResolution, IllegalMove> {
    board.apply_move(row, col, mover)?;
    debug!("Move applied: {:?} at ({}, {})", mover, row, col);

    let outcome = match board.outcome() {
        None => {
            session.flip_turn();
            return Ok(MoveResolution::Continue {
                next: session.turn(),
            });
        }
        Some(BoardOutcome::Win(winner)) => {
            session.record_win(winner);
            GameOutcome::Win {
                winner,
                name: session.name(winner).to_string(),
            }
        }
        Some(BoardOutcome::Draw) => {
            session.record_tie();
            GameOutcome::Draw
        }
    };

    info!(
        "Game over: {:?}. Games played: {}",
        outcome,
        session.games_played()
    );
    let final_board = board.clone();
    board.reset();
    Ok(MoveResolution::Finished {
        outcome,
        final_board,
    })
}

/// Ends the game in progress without a result.
pub fn handle_forced_end(session: &mut Session) -> GameOutcome {
    session.record_forced_end();
    info!(
        "Game cut short. Games played: {}",
        session.games_played()
    );
    GameOutcome::ForcedEnd
}

/// Prepares the next game. Counters are kept.
pub fn handle_restart(board: &mut Board, session: &mut Session) {
    board.reset();
    session.reset_turn();
    info!(
        "Game reset. First player: {}. Games played so far: {}",
        session.active_name(),
        session.games_played()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Board, Session) {
        (
            Board::new(),
            Session::register_players("Alice", "Bob", Marker::First),
        )
    }

    #[test]
    fn test_non_terminal_move_flips_turn() {
        let (mut board, mut session) = setup();
        let resolution = handle_move(&mut board, &mut session, 1, 1, Marker::First).unwrap();

        assert_eq!(
            resolution,
            MoveResolution::Continue {
                next: Marker::Second
            }
        );
        assert_eq!(session.games_played(), 0);
    }

    #[test]
    fn test_winning_move_records_and_clears_board() {
        let (mut board, mut session) = setup();
        let moves = [
            (0, 0, Marker::First),
            (0, 1, Marker::Second),
            (1, 1, Marker::First),
            (0, 2, Marker::Second),
        ];
        for (row, col, mover) in moves {
            handle_move(&mut board, &mut session, row, col, mover).unwrap();
        }

        let resolution = handle_move(&mut board, &mut session, 2, 2, Marker::First).unwrap();

        match resolution {
            MoveResolution::Finished {
                outcome,
                final_board,
            } => {
                assert_eq!(
                    outcome,
                    GameOutcome::Win {
                        winner: Marker::First,
                        name: "Alice".to_string()
                    }
                );
                assert!(final_board.is_winner());
            }
            other => panic!("expected a finished game, got {:?}", other),
        }
        assert!(board.is_empty());
        assert_eq!(session.wins(Marker::First), 1);
        assert_eq!(session.losses(Marker::Second), 1);
        assert_eq!(session.games_played(), 1);
        // turn is not flipped on a terminal move
        assert_eq!(session.turn(), Marker::First);
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let (mut board, mut session) = setup();
        handle_move(&mut board, &mut session, 0, 0, Marker::First).unwrap();
        let (board_before, session_before) = (board.clone(), session.clone());

        let err = handle_move(&mut board, &mut session, 0, 0, Marker::Second).unwrap_err();

        assert_eq!(err, IllegalMove::Occupied { row: 0, col: 0 });
        assert_eq!(board, board_before);
        assert_eq!(session, session_before);
    }

    #[test]
    fn test_restart_keeps_counters() {
        let (mut board, mut session) = setup();
        session.record_tie();
        handle_move(&mut board, &mut session, 0, 0, Marker::First).unwrap();

        handle_restart(&mut board, &mut session);

        assert!(board.is_empty());
        assert_eq!(session.turn(), Marker::First);
        assert_eq!(session.ties(), 1);
        assert_eq!(session.games_played(), 1);
    }

    #[test]
    fn test_forced_end_counts_game_without_result() {
        let (_, mut session) = setup();
        assert_eq!(handle_forced_end(&mut session), GameOutcome::ForcedEnd);
        assert_eq!(session.games_played(), 1);
        assert_eq!(session.ties(), 0);
    }
}
