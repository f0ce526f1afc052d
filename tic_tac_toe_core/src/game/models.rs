use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::IllegalMove;

pub const BOARD_SIZE: usize = 3;

/// Fixed per-player marker, assigned once per session. The first mover
/// always plays `First`, no matter who currently holds the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Marker {
    First,
    Second,
}

impl Marker {
    pub fn other(self) -> Marker {
        match self {
            Marker::First => Marker::Second,
            Marker::Second => Marker::First,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Marker::First => 'X',
            Marker::Second => 'O',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Marker::First => 0,
            Marker::Second => 1,
        }
    }
}

/// Which side of the connection this process is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// Connects to the other peer and moves first ("Player 1").
    Initiator,
    /// Accepts the connection and moves second ("Player 2").
    Listener,
}

impl PeerRole {
    pub fn marker(self) -> Marker {
        match self {
            PeerRole::Initiator => Marker::First,
            PeerRole::Listener => Marker::Second,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Mark(Marker),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// How a finished game was resolved on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardOutcome {
    Win(Marker),
    Draw,
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Marks `(row, col)` for `mover`.
    ///
    /// Only occupancy and bounds are checked here; whose turn it is belongs
    /// to the coordinator. A rejected move leaves the board untouched.
    pub fn apply_move(
        &mut self,
        row: usize,
        col: usize,
        mover: Marker,
    ) -> Result<(), IllegalMove> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            debug!("Move rejected: ({}, {}) is out of bounds.", row, col);
            return Err(IllegalMove::OutOfBounds { row, col });
        }
        if !self.cells[row][col].is_empty() {
            debug!("Move rejected: ({}, {}) is already taken.", row, col);
            return Err(IllegalMove::Occupied { row, col });
        }

        self.cells[row][col] = Cell::Mark(mover);
        Ok(())
    }

    /// Returns the marker owning a completed row, column or diagonal.
    pub fn winner(&self) -> Option<Marker> {
        LINES.iter().find_map(|[a, b, c]| {
            match (
                self.cells[a.0][a.1],
                self.cells[b.0][b.1],
                self.cells[c.0][c.1],
            ) {
                (Cell::Mark(x), Cell::Mark(y), Cell::Mark(z)) if x == y && y == z => Some(x),
                _ => None,
            }
        })
    }

    pub fn is_winner(&self) -> bool {
        self.winner().is_some()
    }

    /// True when no empty cell is left. Only a tie if `is_winner` is false.
    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| !cell.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Checks for a win before checking for a full board, so a board that
    /// is both full and winning counts as a win.
    pub fn outcome(&self) -> Option<BoardOutcome> {
        if let Some(marker) = self.winner() {
            Some(BoardOutcome::Win(marker))
        } else if self.is_full() {
            Some(BoardOutcome::Draw)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        debug!("Board reset.");
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f, "---+---+---")?;
            }
            let symbols: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => "   ".to_string(),
                    Cell::Mark(marker) => format!(" {} ", marker.symbol()),
                })
                .collect();
            writeln!(f, "{}", symbols.join("|"))?;
        }
        Ok(())
    }
}
