//! Turn-aware suggestion loop.
//!
//! An [`Advisor`] is fed successive snapshots of a game's move history (for
//! example each time a move list changes) and produces a suggestion whenever
//! it is the assisted side's turn.

use crate::client::EngineClient;
use crate::config::AnalysisSettings;
use crate::score::NO_SCORE;
use crate::{Color, EngineError, SearchLimit};
use serde::{Deserialize, Serialize};

/// Which side, if any, is being assisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Off,
    White,
    Black,
}

impl Mode {
    /// The assisted side.
    pub fn side(self) -> Option<Color> {
        match self {
            Mode::Off => None,
            Mode::White => Some(Color::White),
            Mode::Black => Some(Color::Black),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Mode::Off),
            other => other.parse::<Color>().map(Mode::from),
        }
    }
}

impl From<Color> for Mode {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Mode::White,
            Color::Black => Mode::Black,
        }
    }
}

/// A move to play and how the position looks for the assisted side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub best_move: String,
    pub score: String,
    pub side: Color,
}

pub struct Advisor {
    client: EngineClient,
    mode: Mode,
    limit: SearchLimit,
    eval_fallback: bool,
    last_history: Option<String>,
}

impl Advisor {
    pub fn new(client: EngineClient, settings: &AnalysisSettings) -> Self {
        Self {
            client,
            mode: settings.mode,
            limit: settings.limit,
            eval_fallback: settings.eval_fallback,
            last_history: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch sides. The next snapshot is analysed even if unchanged.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.last_history = None;
    }

    /// Consider a new history snapshot.
    ///
    /// Returns `Ok(None)` when there is nothing to suggest: mode is off, the
    /// snapshot repeats the previous one, it is the opponent's turn, the
    /// history cannot be set up, or the engine found no move.
    pub async fn process(&mut self, history: &str) -> Result<Option<Suggestion>, EngineError> {
        let Some(side) = self.mode.side() else {
            return Ok(None);
        };

        if !history.is_empty() && self.last_history.as_deref() == Some(history) {
            return Ok(None);
        }
        self.last_history = Some(history.to_string());

        let setup = match self.client.positions().build(history) {
            Ok(setup) => setup,
            Err(e) => {
                tracing::debug!("Ignoring snapshot: {}", e);
                return Ok(None);
            }
        };
        if setup.side_to_move != side {
            return Ok(None);
        }

        let best = self.client.best_move_at(&setup, self.limit, side).await?;

        let mut score = best.score;
        if self.eval_fallback && score == NO_SCORE {
            let eval = self.client.evaluation_at(&setup, side).await?;
            if eval.score != NO_SCORE {
                score = eval.score;
            }
        }

        Ok(best.best_move.map(|best_move| {
            tracing::info!(%best_move, %score, %side, "Suggestion");
            Suggestion {
                best_move,
                score,
                side,
            }
        }))
    }
}
