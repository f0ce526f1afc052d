//! Runs a whole session to completion for one peer.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::coordinator::{Decision, Phase, SessionOutcome, TurnCoordinator};
use crate::error::{Error, IllegalMove, Result};
use crate::game::models::Board;
use crate::game::session::SessionSnapshot;

/// What the local player wants to do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    Play { row: usize, col: usize },
    Terminate,
}

/// Source of local decisions, typically a human behind some front end.
#[async_trait]
pub trait LocalPlayer: Send {
    /// Called whenever it is the local player's turn.
    async fn next_move(&mut self, board: &Board) -> anyhow::Result<LocalCommand>;

    /// Called on the deciding peer after every finished game.
    async fn play_again(&mut self, stats: &SessionSnapshot) -> anyhow::Result<bool>;

    /// The last move was refused; `next_move` will be asked again.
    fn on_rejected(&mut self, _reason: &IllegalMove) {}
}

/// Drives handshake, turns and post-game decisions until the session
/// closes, then hands back how it ended and the final statistics.
///
/// Transport failures come back as `Err`; the coordinator still holds the
/// final statistics in that case.
pub async fn run_session<S, P>(
    coordinator: &mut TurnCoordinator<S>,
    player: &mut P,
    local_name: &str,
) -> Result<SessionOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: LocalPlayer + ?Sized,
{
    loop {
        if let Some(outcome) = coordinator.outcome() {
            return Ok(outcome.clone());
        }

        match coordinator.phase() {
            Phase::AwaitingHandshake => coordinator.handshake(local_name).await?,
            Phase::Active => {
                let command = player
                    .next_move(coordinator.board())
                    .await
                    .map_err(Error::LocalPlayer)?;
                match command {
                    LocalCommand::Terminate => return coordinator.request_terminate().await,
                    LocalCommand::Play { row, col } => {
                        match coordinator.submit_local_move(row, col).await {
                            Ok(_) => {}
                            Err(Error::IllegalMove(reason)) => {
                                warn!("Invalid move: {}", reason);
                                player.on_rejected(&reason);
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
            Phase::Passive => {
                coordinator.await_remote_move().await?;
            }
            Phase::Ended if coordinator.is_decider() => {
                let stats = coordinator.snapshot().unwrap_or_default();
                let again = player
                    .play_again(&stats)
                    .await
                    .map_err(Error::LocalPlayer)?;
                if again {
                    coordinator.request_restart().await?;
                } else {
                    return coordinator.request_terminate().await;
                }
            }
            Phase::Ended => match coordinator.await_decision().await? {
                Decision::Restart => info!("Starting a new game."),
                Decision::Terminate(outcome) => return Ok(outcome),
            },
        }
    }
}
