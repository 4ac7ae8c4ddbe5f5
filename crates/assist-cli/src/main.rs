//! chess-assist - Move suggestions from a UCI engine.
//!
//! `best` and `eval` analyse one position given as a move list or FEN.
//! `watch` reads one history snapshot per stdin line and prints a
//! suggestion whenever it is the assisted side's turn.

use clap::{Parser, Subcommand};
use engine_client::{Advisor, AssistConfig, Color, EngineClient, EngineError, Mode, SearchLimit};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// chess-assist - Best moves and scores from a UCI engine.
#[derive(Parser, Debug)]
#[command(name = "chess-assist")]
#[command(about = "Best moves and scores from a UCI engine")]
struct Args {
    /// Path to the TOML configuration file (default: ./chess-assist.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine program to run, overriding the config file
    #[arg(long)]
    engine: Option<String>,

    /// Search to a fixed depth
    #[arg(long, conflicts_with = "movetime")]
    depth: Option<u32>,

    /// Search for a fixed time in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    /// Side to assist in `watch` mode (off, white, black)
    #[arg(long)]
    side: Option<Mode>,

    /// Give up on a request after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the best move and score for a position
    Best {
        /// Moves from the start position (SAN or coordinate), or a FEN
        moves: Vec<String>,

        /// Report the score for this side (default: side to move)
        #[arg(long)]
        perspective: Option<Color>,
    },
    /// Print the static evaluation of a position
    Eval {
        /// Moves from the start position (SAN or coordinate), or a FEN
        moves: Vec<String>,

        /// Report the score for this side (default: side to move)
        #[arg(long)]
        perspective: Option<Color>,
    },
    /// Suggest moves for each history snapshot read from stdin
    Watch,
}

impl Args {
    /// Load the configuration file and apply command-line overrides.
    fn settings(&self) -> anyhow::Result<AssistConfig> {
        let config = match &self.config {
            Some(path) => AssistConfig::load_from(path)?,
            None => AssistConfig::load()?,
        };
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: AssistConfig) -> AssistConfig {
        if let Some(engine) = &self.engine {
            config.engine.command = engine.clone();
        }
        if let Some(depth) = self.depth {
            config.analysis.limit = SearchLimit::Depth(depth);
        }
        if let Some(movetime) = self.movetime {
            config.analysis.limit = SearchLimit::Time(movetime);
        }
        if let Some(side) = self.side {
            config.analysis.mode = side;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.analysis.timeout_ms = timeout_ms;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let config = args.settings()?;

    tracing::debug!(engine = %config.engine.command, limit = ?config.analysis.limit, "Starting");

    let mut client = EngineClient::launch(&config.engine);
    if let Some(timeout) = config.analysis.timeout() {
        client = client.with_timeout(timeout);
    }

    match args.command {
        Command::Best { moves, perspective } => {
            let history = moves.join(" ");
            let perspective = perspective.unwrap_or_else(|| side_to_move(&client, &history));
            let result = client
                .best_move(config.analysis.limit, &history, perspective)
                .await?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Eval { moves, perspective } => {
            let history = moves.join(" ");
            let perspective = perspective.unwrap_or_else(|| side_to_move(&client, &history));
            let result = client.evaluation(&history, perspective).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Watch => watch(client, &config).await?,
    }

    Ok(())
}

/// Side to move in `history`, or White when it cannot be set up.
fn side_to_move(client: &EngineClient, history: &str) -> Color {
    client
        .positions()
        .build(history)
        .map(|setup| setup.side_to_move)
        .unwrap_or_default()
}

async fn watch(client: EngineClient, config: &AssistConfig) -> anyhow::Result<()> {
    let mut advisor = Advisor::new(client, &config.analysis);
    if advisor.mode() == Mode::Off {
        tracing::warn!("Assist mode is off, nothing will be suggested (use --side)");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match advisor.process(line.trim()).await {
            Ok(Some(suggestion)) => println!("{}", serde_json::to_string(&suggestion)?),
            Ok(None) => {}
            Err(e @ EngineError::Timeout(_)) => tracing::warn!("Skipping snapshot: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("Input closed");
    Ok(())
}
