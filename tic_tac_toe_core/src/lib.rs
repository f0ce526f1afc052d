//! Turn synchronization for two-player tic-tac-toe over a direct
//! connection.
//!
//! Each peer runs a [`TurnCoordinator`] that owns its own [`Board`] and
//! [`Session`]. The peers stay in agreement by exchanging moves only; win
//! and draw detection runs independently, and identically, on both sides.

pub mod coordinator;
pub mod driver;
pub mod error;
pub mod events;
pub mod game;
pub mod ws_socket;

pub use coordinator::{
    Decision, Phase, SessionOutcome, Termination, TurnCoordinator, TurnOutcome,
};
pub use driver::{run_session, LocalCommand, LocalPlayer};
pub use error::{Error, IllegalMove, Result};
pub use events::{EventHub, GameEvent};
pub use game::handlers::GameOutcome;
pub use game::message::{DecodeError, WireMessage, MAX_MESSAGE_LEN};
pub use game::models::{Board, BoardOutcome, Cell, Marker, PeerRole};
pub use game::session::{Session, SessionSnapshot};
pub use ws_socket::Transport;
