use tic_tac_toe_core::game::models::BOARD_SIZE;

/// A line typed by the local player while it is their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Zero-based cell coordinates.
    Cell { row: usize, col: usize },
    Quit,
}

/// Parses `"<row> <col>"` or `"<row>,<col>"` with 1-based coordinates, or
/// `q`/`quit`.
pub fn parse_move(line: &str) -> Result<InputCommand, String> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(InputCommand::Quit);
    }

    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    let [row, col] = parts.as_slice() else {
        return Err(format!("expected \"row col\", got {:?}", line));
    };

    let row = parse_coordinate(row)?;
    let col = parse_coordinate(col)?;
    Ok(InputCommand::Cell { row, col })
}

fn parse_coordinate(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if (1..=BOARD_SIZE).contains(&n) => Ok(n - 1),
        _ => Err(format!("{:?} is not a number from 1 to {}", text, BOARD_SIZE)),
    }
}

/// Only an explicit yes keeps the session going.
pub fn parse_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_accepts_both_separators() {
        assert_eq!(parse_move("1 3"), Ok(InputCommand::Cell { row: 0, col: 2 }));
        assert_eq!(parse_move(" 2,2 "), Ok(InputCommand::Cell { row: 1, col: 1 }));
        assert_eq!(parse_move("3, 1"), Ok(InputCommand::Cell { row: 2, col: 0 }));
    }

    #[test]
    fn test_parse_move_quit() {
        assert_eq!(parse_move("q"), Ok(InputCommand::Quit));
        assert_eq!(parse_move("QUIT"), Ok(InputCommand::Quit));
    }

    #[test]
    fn test_parse_move_rejects_bad_input() {
        assert!(parse_move("").is_err());
        assert!(parse_move("1").is_err());
        assert!(parse_move("0 1").is_err());
        assert!(parse_move("4 1").is_err());
        assert!(parse_move("a b").is_err());
        assert!(parse_move("1 2 3").is_err());
    }

    #[test]
    fn test_parse_yes() {
        assert!(parse_yes("y"));
        assert!(parse_yes(" Yes\n"));
        assert!(!parse_yes("n"));
        assert!(!parse_yes("maybe"));
    }
}
