use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use tic_tac_toe_core::{Board, IllegalMove, LocalCommand, LocalPlayer, PeerRole, SessionSnapshot};
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use super::model::{parse_move, parse_yes, InputCommand};

/// Line-oriented stdin reader.
pub struct TerminalInput {
    lines: Lines<BufReader<Stdin>>,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// Prints `prompt` and reads one line. `None` on end of input.
    pub async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    pub async fn prompt_name(&mut self, role: PeerRole) -> Result<String> {
        let label = match role {
            PeerRole::Initiator => "Player 1",
            PeerRole::Listener => "Player 2",
        };
        loop {
            let prompt = format!("Enter your user name as ({}): ", label);
            match self.read_line(&prompt).await? {
                Some(name) if !name.trim().is_empty() => return Ok(name.trim().to_string()),
                Some(_) => println!("Name cannot be empty."),
                None => anyhow::bail!("input closed before a name was entered"),
            }
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

/// The human at this terminal.
pub struct TerminalPlayer {
    input: TerminalInput,
}

impl TerminalPlayer {
    pub fn new(input: TerminalInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl LocalPlayer for TerminalPlayer {
    async fn next_move(&mut self, _board: &Board) -> Result<LocalCommand> {
        loop {
            let Some(line) = self
                .input
                .read_line("Your move (row col, 1-3), or q to quit: ")
                .await?
            else {
                debug!("Input closed, ending the session.");
                return Ok(LocalCommand::Terminate);
            };

            match parse_move(&line) {
                Ok(InputCommand::Cell { row, col }) => return Ok(LocalCommand::Play { row, col }),
                Ok(InputCommand::Quit) => return Ok(LocalCommand::Terminate),
                Err(reason) => println!("Invalid move: {}", reason),
            }
        }
    }

    async fn play_again(&mut self, _stats: &SessionSnapshot) -> Result<bool> {
        let answer = self
            .input
            .read_line("The game has ended... Play again? (y/n) ")
            .await?;
        Ok(answer.as_deref().is_some_and(parse_yes))
    }

    fn on_rejected(&mut self, reason: &IllegalMove) {
        println!("Invalid move: {}", reason);
    }
}
