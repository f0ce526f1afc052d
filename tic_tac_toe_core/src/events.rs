use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::coordinator::SessionOutcome;
use crate::game::handlers::GameOutcome;
use crate::game::models::{Board, Marker};
use crate::game::session::SessionSnapshot;

const EVENT_CAPACITY: usize = 64;

/// Notifications for the presentation layer. The core never holds a
/// reference to anything it renders into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    TurnChanged {
        active: Marker,
        name: String,
        local: bool,
    },
    MoveApplied {
        row: usize,
        col: usize,
        marker: Marker,
    },
    GameEnded {
        outcome: GameOutcome,
        final_board: Board,
    },
    BoardReset,
    SessionStats(SessionSnapshot),
    SessionClosed(SessionOutcome),
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<GameEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    /// Publishes to current subscribers. Having none is fine.
    pub fn emit(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            debug!("No subscribers for game event.");
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
