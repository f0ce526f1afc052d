use tic_tac_toe_core::{Board, GameEvent, GameOutcome, SessionOutcome, SessionSnapshot, Termination};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Renders core events to stdout. Keeps its own copy of the board, built
/// only from `MoveApplied` and `BoardReset`.
pub struct GameApp {
    events: broadcast::Receiver<GameEvent>,
    board: Board,
    stats: Option<SessionSnapshot>,
}

impl GameApp {
    pub fn new(events: broadcast::Receiver<GameEvent>) -> Self {
        Self {
            events,
            board: Board::new(),
            stats: None,
        }
    }

    /// Runs until the core drops its event hub.
    pub async fn run(mut self) {
        loop {
            match self.events.recv().await {
                Ok(event) => self.handle(event),
                Err(RecvError::Lagged(skipped)) => warn!("Display skipped {} events.", skipped),
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Display stopped.");
    }

    fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::TurnChanged { name, local, .. } => {
                println!("Turn: {}", name);
                if !local {
                    println!("Waiting...");
                }
            }
            GameEvent::MoveApplied { row, col, marker } => {
                if let Err(e) = self.board.apply_move(row, col, marker) {
                    warn!("Display board out of step: {}", e);
                }
                println!("\n{}", self.board);
            }
            GameEvent::GameEnded { outcome, .. } => {
                let status = match outcome {
                    GameOutcome::Win { name, .. } => format!("{} is the Winner!", name),
                    GameOutcome::Draw => "It's a tie!".to_string(),
                    GameOutcome::ForcedEnd => "The game was ended early.".to_string(),
                };
                println!("{}", status);
                if let Some(stats) = &self.stats {
                    println!("Score: {}", score_line(stats));
                }
            }
            GameEvent::BoardReset => {
                self.board.reset();
                println!("\nGame Start!");
            }
            GameEvent::SessionStats(stats) => self.stats = Some(stats),
            GameEvent::SessionClosed(outcome) => print_final_stats(&outcome),
        }
    }
}

fn score_line(stats: &SessionSnapshot) -> String {
    format!(
        "{} wins, {} losses, {} ties",
        stats.wins, stats.losses, stats.ties
    )
}

fn print_final_stats(outcome: &SessionOutcome) {
    let reason = match &outcome.termination {
        Termination::LocalRequest => "You ended the session.".to_string(),
        Termination::RemoteRequest => "Your opponent ended the session.".to_string(),
        Termination::ProtocolViolation(detail) => {
            format!("Your opponent sent something unexpected ({}).", detail)
        }
        Termination::TransportLost(detail) => format!("The connection was lost ({}).", detail),
    };
    let stats = &outcome.stats;

    println!("\nThe game has ended! {}", reason);
    println!("Final Statistics:");
    println!("Players: {} vs {}", stats.first_name, stats.second_name);
    println!("Games Played: {}", stats.games_played);
    println!("Number of Wins ({}): {}", stats.local_name, stats.wins);
    println!("Number of Losses ({}): {}", stats.local_name, stats.losses);
    println!("Number of Ties: {}", stats.ties);
}
