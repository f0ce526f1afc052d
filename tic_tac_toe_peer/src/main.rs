mod game_app;
mod game_service;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tic_tac_toe_core::{run_session, PeerRole, Transport, TurnCoordinator};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::game_app::GameApp;
use crate::game_service::{TerminalInput, TerminalPlayer};

#[derive(Parser)]
#[command(version, about = "Two-player tic-tac-toe over a direct connection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for an opponent to connect. You play second.
    Host {
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
        #[arg(long)]
        name: Option<String>,
    },
    /// Connect to a waiting opponent. You play first.
    Join {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut input = TerminalInput::new();

    let (transport, role, name) = match cli.command {
        Command::Host { bind, port, name } => {
            println!("Waiting for an opponent on {}:{}...", bind, port);
            let transport = Transport::listen((bind.as_str(), port))
                .await
                .with_context(|| format!("could not accept a connection on {}:{}", bind, port))?;
            (transport, PeerRole::Listener, name)
        }
        Command::Join { host, port, name } => {
            let transport = Transport::connect(&host, port)
                .await
                .with_context(|| format!("could not connect to {}:{}", host, port))?;
            (transport, PeerRole::Initiator, name)
        }
    };

    if let Some(peer) = transport.peer_addr() {
        println!("Connected to {}.", peer);
    }

    let name = match name {
        Some(name) => name,
        None => input.prompt_name(role).await?,
    };

    let mut coordinator = TurnCoordinator::new(transport, role);
    let display = tokio::spawn(GameApp::new(coordinator.subscribe()).run());

    let mut player = TerminalPlayer::new(input);
    let result = run_session(&mut coordinator, &mut player, &name).await;

    // closing the event hub lets the display drain and stop
    drop(coordinator);
    if let Err(e) = display.await {
        error!("❌ Display task failed: {}", e);
    }

    match result {
        Ok(outcome) => {
            info!("Session over: {:?}", outcome.termination);
            Ok(())
        }
        Err(e) => Err(e).context("session ended with an error"),
    }
}
