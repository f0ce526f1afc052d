use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::Marker;

/// Statistics as seen from the local player's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub first_name: String,
    pub second_name: String,
    pub local_name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// Player identities, the turn pointer and running totals for one
/// connection. Counters only ever grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    names: [String; 2],
    local: Marker,
    turn: Marker,
    wins: [u32; 2],
    losses: [u32; 2],
    ties: u32,
    games_played: u32,
}

impl Session {
    /// Registers both players. `first_name` belongs to the first mover, who
    /// plays `Marker::First` and holds the opening turn.
    pub fn register_players(
        first_name: impl Into<String>,
        second_name: impl Into<String>,
        local: Marker,
    ) -> Self {
        let session = Session {
            names: [first_name.into(), second_name.into()],
            local,
            turn: Marker::First,
            wins: [0; 2],
            losses: [0; 2],
            ties: 0,
            games_played: 0,
        };
        debug!(
            "Session registered: {} (first) vs {} (second), local is {:?}",
            session.names[0], session.names[1], local
        );
        session
    }

    pub fn name(&self, marker: Marker) -> &str {
        &self.names[marker.index()]
    }

    pub fn local_marker(&self) -> Marker {
        self.local
    }

    pub fn remote_marker(&self) -> Marker {
        self.local.other()
    }

    pub fn turn(&self) -> Marker {
        self.turn
    }

    pub fn active_name(&self) -> &str {
        self.name(self.turn)
    }

    pub fn is_local_turn(&self) -> bool {
        self.turn == self.local
    }

    pub fn flip_turn(&mut self) {
        self.turn = self.turn.other();
        debug!("Turn switched: now it's {}'s turn.", self.active_name());
    }

    /// Hands the turn back to the first mover for a new game.
    pub fn reset_turn(&mut self) {
        self.turn = Marker::First;
    }

    pub fn record_win(&mut self, winner: Marker) {
        self.wins[winner.index()] += 1;
        self.losses[winner.other().index()] += 1;
        self.games_played += 1;
        debug!("Win recorded for {}.", self.name(winner));
    }

    pub fn record_tie(&mut self) {
        self.ties += 1;
        self.games_played += 1;
        debug!("Tie recorded.");
    }

    /// Counts a game that was cut short, without attributing a result.
    pub fn record_forced_end(&mut self) {
        self.games_played += 1;
        debug!("Forced end recorded.");
    }

    pub fn wins(&self, marker: Marker) -> u32 {
        self.wins[marker.index()]
    }

    pub fn losses(&self, marker: Marker) -> u32 {
        self.losses[marker.index()]
    }

    pub fn ties(&self) -> u32 {
        self.ties
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            first_name: self.names[0].clone(),
            second_name: self.names[1].clone(),
            local_name: self.name(self.local).to_string(),
            games_played: self.games_played,
            wins: self.wins(self.local),
            losses: self.losses(self.local),
            ties: self.ties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice_vs_bob() -> Session {
        Session::register_players("Alice", "Bob", Marker::First)
    }

    #[test]
    fn test_first_mover_holds_opening_turn() {
        let session = Session::register_players("Alice", "Bob", Marker::Second);
        assert_eq!(session.turn(), Marker::First);
        assert_eq!(session.active_name(), "Alice");
        assert!(!session.is_local_turn());
        assert_eq!(session.remote_marker(), Marker::First);
    }

    #[test]
    fn test_flip_and_reset_turn() {
        let mut session = alice_vs_bob();
        session.flip_turn();
        assert_eq!(session.active_name(), "Bob");
        session.reset_turn();
        assert_eq!(session.turn(), Marker::First);
    }

    #[test]
    fn test_win_attributes_loss_to_other_player() {
        let mut session = alice_vs_bob();
        session.record_win(Marker::Second);

        assert_eq!(session.wins(Marker::Second), 1);
        assert_eq!(session.losses(Marker::First), 1);
        assert_eq!(session.wins(Marker::First), 0);
        assert_eq!(session.games_played(), 1);
    }

    #[test]
    fn test_forced_end_only_counts_games() {
        let mut session = alice_vs_bob();
        session.record_forced_end();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.games_played, 1);
        assert_eq!((snapshot.wins, snapshot.losses, snapshot.ties), (0, 0, 0));
    }

    #[test]
    fn test_totals_stay_consistent_over_many_games() {
        let mut session = alice_vs_bob();
        let results = [
            Some(Marker::First),
            None,
            Some(Marker::Second),
            Some(Marker::First),
            None,
        ];
        for result in results {
            match result {
                Some(winner) => session.record_win(winner),
                None => session.record_tie(),
            }
        }

        let n = results.len() as u32;
        let wins = session.wins(Marker::First) + session.wins(Marker::Second);
        let losses = session.losses(Marker::First) + session.losses(Marker::Second);
        assert_eq!(session.games_played(), n);
        assert_eq!(wins + losses, 2 * (n - session.ties()));
    }

    #[test]
    fn test_snapshot_uses_local_profile() {
        let mut session = Session::register_players("Alice", "Bob", Marker::Second);
        session.record_win(Marker::First);
        session.record_tie();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.local_name, "Bob");
        assert_eq!(snapshot.first_name, "Alice");
        assert_eq!(snapshot.second_name, "Bob");
        assert_eq!(snapshot.wins, 0);
        assert_eq!(snapshot.losses, 1);
        assert_eq!(snapshot.ties, 1);
        assert_eq!(snapshot.games_played, 2);
    }
}
