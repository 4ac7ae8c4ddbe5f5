//! Perspective normalization and display of engine scores.
//!
//! Engines report scores relative to the side to move. Callers want them
//! relative to the side they play. Two independent flips get there:
//! side to move -> White, then White -> requested perspective.

use crate::Color;
use uci::Score;

/// Display value used when no score is available.
pub const NO_SCORE: &str = "0.00";

/// Re-express a side-to-move score from `perspective`'s point of view.
pub fn relative_to(score: Score, side_to_move: Color, perspective: Color) -> Score {
    let mut score = score;
    if side_to_move == Color::Black {
        score = score.negate();
    }
    if perspective == Color::Black {
        score = score.negate();
    }
    score
}

/// Render an already-normalized score.
///
/// Centipawns become pawns with two decimals, `+` prefixed only when
/// strictly positive. Mates become `+M<n>` / `-M<n>`.
pub fn render(score: Score) -> String {
    match score {
        Score::Cp(cp) => {
            let sign = match cp.signum() {
                1 => "+",
                -1 => "-",
                _ => "",
            };
            let abs = cp.unsigned_abs();
            format!("{}{}.{:02}", sign, abs / 100, abs % 100)
        }
        Score::Mate(n) => {
            let sign = if n > 0 { '+' } else { '-' };
            format!("{}M{}", sign, n.unsigned_abs())
        }
    }
}

/// Normalize and render in one go; a missing score renders as [`NO_SCORE`].
pub fn display(score: Option<Score>, side_to_move: Color, perspective: Color) -> String {
    match score {
        Some(score) => render(relative_to(score, side_to_move, perspective)),
        None => NO_SCORE.to_string(),
    }
}
