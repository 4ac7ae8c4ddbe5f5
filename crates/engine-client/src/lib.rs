//! Engine client for computer-assisted move suggestions.
//!
//! This crate drives a single UCI analysis engine (Stockfish or similar)
//! on behalf of an interface that wants a best move and a human-readable
//! score for the current game.
//!
//! # Overview
//!
//! - [`PositionBuilder`] - Turns a move list or FEN into a `position` command
//! - [`MoveTranslator`] - SAN / coordinate move translation via `shakmaty`
//! - [`EngineSession`] - The job queue: one request in flight, strict FIFO
//! - [`score`] - Perspective normalization and display of scores
//! - [`EngineChannel`] - Text channel to an engine process or in-process peer
//! - [`EngineClient`] - Async `best_move` / `evaluation` API
//! - [`Advisor`] - Suggests moves only on the assisted side's turn
//!
//! # Example
//!
//! ```no_run
//! use engine_client::{Color, EngineClient, EngineSettings, SearchLimit};
//!
//! # async fn run() -> Result<(), engine_client::EngineError> {
//! let client = EngineClient::launch(&EngineSettings::default());
//! let result = client
//!     .best_move(SearchLimit::Depth(15), "e4 e5 Nf3", Color::Black)
//!     .await?;
//! println!("{:?} {}", result.best_move, result.score);
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod channel;
pub mod client;
pub mod color;
pub mod config;
pub mod error;
pub mod position;
pub mod queue;
pub mod request;
pub mod score;
pub mod translate;

pub use advisor::{Advisor, Mode, Suggestion};
pub use channel::{EngineChannel, EnginePeer};
pub use client::EngineClient;
pub use color::Color;
pub use config::{AnalysisSettings, AssistConfig, ConfigError, EngineSettings};
pub use error::EngineError;
pub use position::{PositionBuilder, PositionError, PositionFormat, PositionSetup};
pub use queue::EngineSession;
pub use request::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, BestMove, Evaluation, SearchLimit,
};
pub use translate::{IllegalMove, MoveTranslator, StandardTranslator};
