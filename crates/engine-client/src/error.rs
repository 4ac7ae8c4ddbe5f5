//! Errors surfaced by the engine client.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when working with the analysis engine.
///
/// Malformed move history and missing scores are not errors; they degrade
/// to an empty result instead. Only the absence of a working engine is
/// reported through this type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No engine channel exists, or it has shut down.
    #[error("Engine unavailable")]
    Unavailable,
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[from] std::io::Error),
    /// The configured engine command has no program name.
    #[error("Engine command is empty")]
    EmptyCommand,
    /// A caller-side timeout elapsed before the engine answered.
    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),
}
