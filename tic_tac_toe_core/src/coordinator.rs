//! The alternating-turn protocol.
//!
//! Exactly one peer is `Active` (may move) while the other is `Passive`
//! (blocked on the opponent's move). Local input is only accepted while
//! `Active` and inbound messages are only processed while `Passive`, so the
//! send and receive paths never mutate the board or session at the same
//! time. Both peers run this same machine and stay in agreement purely by
//! exchanging moves; the board itself is never sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::{Error, IllegalMove, Result};
use crate::events::{EventHub, GameEvent};
use crate::game::handlers::{
    handle_forced_end, handle_move, handle_restart, GameOutcome, MoveResolution,
};
use crate::game::message::WireMessage;
use crate::game::models::{Board, Marker, PeerRole};
use crate::game::session::{Session, SessionSnapshot};
use crate::ws_socket::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingHandshake,
    Active,
    Passive,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::AwaitingHandshake => "awaiting the handshake",
            Phase::Active => "active",
            Phase::Passive => "passive",
            Phase::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Why the session stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    LocalRequest,
    RemoteRequest,
    /// The peer sent something that could not be decoded or applied.
    ProtocolViolation(String),
    TransportLost(String),
}

/// Returned to the caller once the session is over, in place of exiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub termination: Termination,
    pub stats: SessionSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn passed to the other peer.
    Continue,
    GameOver {
        outcome: GameOutcome,
        final_board: Board,
    },
    SessionEnded(SessionOutcome),
}

/// What the peer that does not decide learns after a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Restart,
    Terminate(SessionOutcome),
}

pub struct TurnCoordinator<S> {
    transport: Transport<S>,
    role: PeerRole,
    phase: Phase,
    board: Board,
    session: Option<Session>,
    events: EventHub,
    closed: Option<SessionOutcome>,
}

impl<S> TurnCoordinator<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(transport: Transport<S>, role: PeerRole) -> Self {
        Self {
            transport,
            role,
            phase: Phase::AwaitingHandshake,
            board: Board::new(),
            session: None,
            events: EventHub::new(),
            closed: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// Set once the session is over for good; no restart is possible then.
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.closed.as_ref()
    }

    /// The first mover decides whether to play again after each game.
    pub fn is_decider(&self) -> bool {
        self.role == PeerRole::Initiator
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Exchanges names with the peer. Both sides send first and then read,
    /// and both end up with the same (first, second) pair. The initiator
    /// comes out `Active`, the listener `Passive`.
    pub async fn handshake(&mut self, local_name: &str) -> Result<()> {
        self.expect_phase(Phase::AwaitingHandshake, "handshake")?;

        let local_name = local_name.trim();
        if local_name.is_empty() {
            return Err(Error::InvalidName);
        }

        self.transport
            .send(&WireMessage::Handshake {
                name: local_name.to_string(),
            })
            .await?;
        let payload = self.transport.recv().await?;
        let remote_name = WireMessage::decode_handshake(&payload)?;

        let (first, second) = match self.role {
            PeerRole::Initiator => (local_name.to_string(), remote_name),
            PeerRole::Listener => (remote_name, local_name.to_string()),
        };
        let session = Session::register_players(first, second, self.role.marker());
        info!(
            "✅ Handshake complete: {} vs {}",
            session.name(Marker::First),
            session.name(Marker::Second)
        );

        self.phase = if session.is_local_turn() {
            Phase::Active
        } else {
            Phase::Passive
        };
        self.events.emit(GameEvent::SessionStats(session.snapshot()));
        self.session = Some(session);
        self.emit_turn();
        Ok(())
    }

    /// Plays `(row, col)` for the local player.
    ///
    /// An `IllegalMove` (occupied cell, out of bounds, or not `Active`)
    /// leaves everything untouched and sends nothing; the caller may retry.
    pub async fn submit_local_move(&mut self, row: usize, col: usize) -> Result<TurnOutcome> {
        if self.phase != Phase::Active {
            debug!("Move rejected: phase is {}.", self.phase);
            return Err(IllegalMove::NotYourTurn.into());
        }

        let (board, session) = self.game_mut("submit move")?;
        let mover = session.local_marker();
        let resolution = handle_move(board, session, row, col, mover)?;
        self.events.emit(GameEvent::MoveApplied {
            row,
            col,
            marker: mover,
        });

        if let Err(e) = self.transport.send(&WireMessage::Move { row, col }).await {
            return Err(self.lose_transport(e).await);
        }
        info!("Move sent: ({}, {})", row, col);

        Ok(self.after_move(resolution, Phase::Passive))
    }

    /// Blocks until the opponent's message arrives and applies it.
    ///
    /// The move is trusted to come from the peer whose turn it is. A
    /// `Terminate` ends the session as a forced end. Anything else that is
    /// not a decodable, applicable move closes the session without counting
    /// the game. Cancel safe: state only changes once a message is in.
    pub async fn await_remote_move(&mut self) -> Result<TurnOutcome> {
        self.expect_phase(Phase::Passive, "await remote move")?;

        let payload = match self.transport.recv().await {
            Ok(payload) => payload,
            Err(Error::ProtocolDecode(e)) => return Ok(self.reject_peer(e.to_string()).await),
            Err(e) => return Err(self.lose_transport(e).await),
        };

        let (row, col) = match WireMessage::decode(&payload) {
            Ok(WireMessage::Move { row, col }) => (row, col),
            Ok(WireMessage::Terminate) => {
                info!("Opponent ended the session.");
                self.record_forced_end()?;
                return Ok(TurnOutcome::SessionEnded(
                    self.close_session(Termination::RemoteRequest).await,
                ));
            }
            Ok(other) => {
                warn!("Unexpected message during play: {:?}", other);
                return Ok(self
                    .reject_peer(format!("unexpected {:?} during play", other))
                    .await);
            }
            Err(e) => {
                warn!("Undecodable payload from opponent: {}", e);
                return Ok(self.reject_peer(e.to_string()).await);
            }
        };

        let (board, session) = self.game_mut("await remote move")?;
        let mover = session.remote_marker();
        match handle_move(board, session, row, col, mover) {
            Ok(resolution) => {
                info!("Opponent played ({}, {})", row, col);
                self.events.emit(GameEvent::MoveApplied {
                    row,
                    col,
                    marker: mover,
                });
                Ok(self.after_move(resolution, Phase::Active))
            }
            Err(illegal) => {
                error!("Boards out of sync, opponent move rejected: {}", illegal);
                Ok(self.reject_peer(illegal.to_string()).await)
            }
        }
    }

    /// Starts a new game after a finished one. Only the decider may call
    /// this; the other peer learns about it through `await_decision`.
    pub async fn request_restart(&mut self) -> Result<()> {
        self.expect_open_ended("restart")?;
        if !self.is_decider() {
            return Err(Error::NotDecider);
        }

        if let Err(e) = self.transport.send(&WireMessage::Restart).await {
            return Err(self.lose_transport(e).await);
        }
        self.restart()
    }

    /// Ends the session from this side. Allowed on the local turn, where it
    /// counts as a forced end, and for the decider after a finished game,
    /// where nothing more is recorded. Calling it again returns the same
    /// outcome.
    ///
    /// A `Passive` peer or the listener between games is refused: the other
    /// side is not reading then and could finish or restart a game this
    /// side never sees.
    pub async fn request_terminate(&mut self) -> Result<SessionOutcome> {
        if let Some(outcome) = &self.closed {
            return Ok(outcome.clone());
        }
        match self.phase {
            Phase::AwaitingHandshake => {
                return Err(Error::InvalidPhase {
                    operation: "terminate",
                    phase: self.phase,
                })
            }
            Phase::Passive => return Err(IllegalMove::NotYourTurn.into()),
            Phase::Ended if !self.is_decider() => return Err(Error::NotDecider),
            Phase::Active | Phase::Ended => {}
        }

        if let Err(e) = self.transport.send(&WireMessage::Terminate).await {
            warn!("Could not notify opponent of termination: {}", e);
        }

        if self.phase == Phase::Active {
            self.record_forced_end()?;
        }
        Ok(self.close_session(Termination::LocalRequest).await)
    }

    /// Waits for the decider's restart-or-terminate message after a game.
    pub async fn await_decision(&mut self) -> Result<Decision> {
        self.expect_open_ended("await decision")?;
        if self.is_decider() {
            return Err(Error::InvalidPhase {
                operation: "await decision as the decider",
                phase: self.phase,
            });
        }

        let payload = match self.transport.recv().await {
            Ok(payload) => payload,
            Err(Error::ProtocolDecode(e)) => {
                let outcome = self
                    .close_session(Termination::ProtocolViolation(e.to_string()))
                    .await;
                return Ok(Decision::Terminate(outcome));
            }
            Err(e) => return Err(self.lose_transport(e).await),
        };

        let termination = match WireMessage::decode(&payload) {
            Ok(WireMessage::Restart) => {
                info!("Opponent wants to play again.");
                self.restart()?;
                return Ok(Decision::Restart);
            }
            Ok(WireMessage::Terminate) => Termination::RemoteRequest,
            Ok(other) => {
                warn!("Unexpected message after game: {:?}", other);
                Termination::ProtocolViolation(format!("unexpected {:?} after game", other))
            }
            Err(e) => {
                warn!("Undecodable payload from opponent: {}", e);
                Termination::ProtocolViolation(e.to_string())
            }
        };
        Ok(Decision::Terminate(self.close_session(termination).await))
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidPhase {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// `Ended` between games, as opposed to a closed session.
    fn expect_open_ended(&self, operation: &'static str) -> Result<()> {
        self.expect_phase(Phase::Ended, operation)?;
        if self.closed.is_some() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    fn game_mut(&mut self, operation: &'static str) -> Result<(&mut Board, &mut Session)> {
        match self.session.as_mut() {
            Some(session) => Ok((&mut self.board, session)),
            None => Err(Error::InvalidPhase {
                operation,
                phase: self.phase,
            }),
        }
    }

    fn after_move(&mut self, resolution: MoveResolution, next_phase: Phase) -> TurnOutcome {
        match resolution {
            MoveResolution::Continue { .. } => {
                self.phase = next_phase;
                self.emit_turn();
                TurnOutcome::Continue
            }
            MoveResolution::Finished {
                outcome,
                final_board,
            } => {
                self.phase = Phase::Ended;
                self.emit_stats();
                self.events.emit(GameEvent::GameEnded {
                    outcome: outcome.clone(),
                    final_board: final_board.clone(),
                });
                TurnOutcome::GameOver {
                    outcome,
                    final_board,
                }
            }
        }
    }

    fn restart(&mut self) -> Result<()> {
        let (board, session) = self.game_mut("restart")?;
        handle_restart(board, session);
        let local_turn = session.is_local_turn();
        self.phase = if local_turn {
            Phase::Active
        } else {
            Phase::Passive
        };
        self.events.emit(GameEvent::BoardReset);
        self.emit_turn();
        Ok(())
    }

    fn record_forced_end(&mut self) -> Result<()> {
        let (board, session) = self.game_mut("forced end")?;
        let outcome = handle_forced_end(session);
        let final_board = board.clone();
        self.emit_stats();
        self.events.emit(GameEvent::GameEnded {
            outcome,
            final_board,
        });
        Ok(())
    }

    /// Closes the session after the peer broke the protocol. The game in
    /// progress is dropped without touching the counters.
    async fn reject_peer(&mut self, detail: String) -> TurnOutcome {
        TurnOutcome::SessionEnded(
            self.close_session(Termination::ProtocolViolation(detail))
                .await,
        )
    }

    async fn close_session(&mut self, termination: Termination) -> SessionOutcome {
        self.phase = Phase::Ended;
        let stats = self.snapshot().unwrap_or_default();
        let outcome = SessionOutcome { termination, stats };
        info!("Session closed: {:?}", outcome.termination);

        self.emit_stats();
        self.events.emit(GameEvent::SessionClosed(outcome.clone()));
        self.closed = Some(outcome.clone());

        if let Err(e) = self.transport.close().await {
            debug!("Error while closing connection: {}", e);
        }
        outcome
    }

    /// Marks the session as lost and hands the error back for the caller.
    async fn lose_transport(&mut self, err: Error) -> Error {
        error!("❌ Transport failure: {}", err);
        if self.closed.is_none() {
            self.close_session(Termination::TransportLost(err.to_string()))
                .await;
        }
        err
    }

    fn emit_turn(&self) {
        if let Some(session) = &self.session {
            self.events.emit(GameEvent::TurnChanged {
                active: session.turn(),
                name: session.active_name().to_string(),
                local: session.is_local_turn(),
            });
        }
    }

    fn emit_stats(&self) {
        if let Some(session) = &self.session {
            self.events.emit(GameEvent::SessionStats(session.snapshot()));
        }
    }
}
