//! UCI (Universal Chess Interface) protocol library.
//!
//! This crate provides the command and message types spoken between a GUI
//! and a UCI chess engine, with serialization for the GUI side and parsing
//! for the engine side.
//!
//! # GUI Commands
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `position startpos [moves <move>...]` / `position fen <fen>` - Set position
//! - `go [movetime <ms>] [depth <d>]` - Start search
//! - `eval` - Static evaluation (Stockfish extension)
//! - `stop` - Stop search
//! - `quit` - Exit engine
//!
//! # Engine Messages
//!
//! - `id name <name>` / `id author <author>`
//! - `uciok`, `readyok`
//! - `info ... score cp|mate <n> ...`
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, InfoBuilder, Score};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum UciError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `None` when the engine has no legal move to offer.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything else the engine prints (banners, evaluation tables).
    Other(String),
}

impl EngineMessage {
    /// Parse a single line of engine output.
    ///
    /// Never fails: lines that are not recognised protocol messages come back
    /// as [`EngineMessage::Other`].
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        match line {
            "uciok" => return EngineMessage::UciOk,
            "readyok" => return EngineMessage::ReadyOk,
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("id ") {
            if let Some(name) = rest.strip_prefix("name ") {
                return EngineMessage::Id {
                    name: Some(name.to_string()),
                    author: None,
                };
            }
            if let Some(author) = rest.strip_prefix("author ") {
                return EngineMessage::Id {
                    name: None,
                    author: Some(author.to_string()),
                };
            }
        }

        if line.starts_with("bestmove") {
            let mv = bestmove_token(line).map(str::to_string);
            let mut parts = line.split_whitespace().skip(2);
            let ponder = match parts.next() {
                Some("ponder") => parts.next().map(str::to_string),
                _ => None,
            };
            return EngineMessage::BestMove { mv, ponder };
        }

        if let Some(info) = EngineInfo::parse(line) {
            return EngineMessage::Info(info);
        }

        EngineMessage::Other(line.to_string())
    }

    /// Format message for output.
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id { name, author } => {
                let mut parts = Vec::new();
                if let Some(n) = name {
                    parts.push(format!("id name {}", n));
                }
                if let Some(a) = author {
                    parts.push(format!("id author {}", a));
                }
                parts.join("\n")
            }
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::Info(info) => info.to_uci(),
            EngineMessage::BestMove { mv, ponder } => {
                let mv = mv.as_deref().unwrap_or("(none)");
                match ponder {
                    Some(p) => format!("bestmove {} ponder {}", mv, p),
                    None => format!("bestmove {}", mv),
                }
            }
            EngineMessage::Other(text) => text.clone(),
        }
    }
}

/// The move following `bestmove` and exactly one whitespace character.
///
/// Only word characters are taken, so `bestmove (none)` yields `None`.
pub fn bestmove_token(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("bestmove")?;
    let sep = rest.chars().next().filter(|c| c.is_whitespace())?;
    let rest = &rest[sep.len_utf8()..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}
