use thiserror::Error;

use crate::coordinator::Phase;
use crate::game::message::DecodeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A local move that was refused. Never fatal: nothing was mutated or sent,
/// and the caller may retry with another cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell ({row}, {col}) is already taken")]
    Occupied { row: usize, col: usize },
    #[error("it is not your turn")]
    NotYourTurn,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),

    #[error("could not decode message: {0}")]
    ProtocolDecode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("could not encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("player name must not be empty")]
    InvalidName,

    #[error("`{operation}` is not allowed while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("only the first mover decides what happens after a game")]
    NotDecider,

    #[error("the session is over")]
    SessionClosed,

    #[error("local player failed: {0}")]
    LocalPlayer(#[source] anyhow::Error),
}

impl Error {
    /// Errors that mean the connection itself is gone or unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Io(_) | Error::ConnectionClosed
        )
    }
}
