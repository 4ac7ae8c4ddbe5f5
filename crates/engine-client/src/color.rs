//! Side representation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Represents the two players in chess.
///
/// Used both for the side to move in an analysed position and for the
/// perspective a score is reported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Side to move after `plies` half-moves from the initial position.
    #[inline]
    pub const fn after_plies(plies: usize) -> Self {
        if plies % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Reads the active-color field of a FEN record.
    ///
    /// Only `b` means Black; anything else, including a missing field,
    /// is treated as White.
    pub fn from_fen_field(field: Option<&str>) -> Self {
        match field {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(format!("unknown color '{}', expected white or black", other)),
        }
    }
}
