//! Translation of human move text into UCI coordinate notation.
//!
//! Move legality and notation are delegated to `shakmaty`; this module only
//! walks the history from the initial position and reports the first token
//! that cannot be played.

use shakmaty::san::SanPlus;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, Move, Position};
use thiserror::Error;

/// The first move of a history that is not legal in sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal move '{token}' at index {index}")]
pub struct IllegalMove {
    /// Zero-based position of the token in the history.
    pub index: usize,
    /// The token as given.
    pub token: String,
}

/// Converts a move history from the standard initial position into
/// coordinate notation (`e2e4`, `e7e8q`, `e1g1`).
pub trait MoveTranslator: Send + Sync {
    fn translate(&self, tokens: &[&str]) -> Result<Vec<String>, IllegalMove>;
}

/// Accepts SAN (`Nf3`, `exd5`, `O-O`, `e8=Q+`) and coordinate notation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTranslator;

impl MoveTranslator for StandardTranslator {
    fn translate(&self, tokens: &[&str]) -> Result<Vec<String>, IllegalMove> {
        let mut position = Chess::default();
        let mut coordinates = Vec::with_capacity(tokens.len());

        for (index, token) in tokens.iter().enumerate() {
            let m = parse_move(&position, token).ok_or_else(|| IllegalMove {
                index,
                token: token.to_string(),
            })?;
            coordinates.push(m.to_uci(CastlingMode::Standard).to_string());
            position.play_unchecked(&m);
        }

        Ok(coordinates)
    }
}

fn parse_move(position: &Chess, token: &str) -> Option<Move> {
    // Annotation glyphs ("!?", "??") are not part of SAN proper.
    let token = token.trim_end_matches(|c| c == '!' || c == '?');

    if let Ok(san) = token.parse::<SanPlus>() {
        if let Ok(m) = san.san.to_move(position) {
            return Some(m);
        }
    }

    token.parse::<Uci>().ok()?.to_move(position).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(history: &str) -> Result<Vec<String>, IllegalMove> {
        let tokens: Vec<&str> = history.split_whitespace().collect();
        StandardTranslator.translate(&tokens)
    }

    #[test]
    fn translates_san_opening() {
        let moves = translate("e4 e5 Nf3 Nc6 Bb5").unwrap();
        assert_eq!(moves, vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
    }

    #[test]
    fn translates_castling_to_king_move() {
        let moves = translate("e4 e5 Nf3 Nc6 Bc4 Bc5 O-O").unwrap();
        assert_eq!(moves.last().unwrap(), "e1g1");
    }

    #[test]
    fn translates_promotion() {
        let moves = translate("h4 g5 hxg5 h6 gxh6 Nf6 h7 Ng8 hxg8=Q").unwrap();
        assert_eq!(moves.last().unwrap(), "h7g8q");
    }

    #[test]
    fn accepts_check_and_annotation_suffixes() {
        let moves = translate("e4 f5 Qh5+ g6 Qxg6+?! hxg6").unwrap();
        assert_eq!(moves[2], "d1h5");
        assert_eq!(moves[4], "h5g6");
        assert_eq!(moves[5], "h7g6");
    }

    #[test]
    fn accepts_coordinate_notation() {
        let moves = translate("e2e4 e7e5 g1f3").unwrap();
        assert_eq!(moves, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn reports_first_illegal_token() {
        let err = translate("e2e4 e2e4").unwrap_err();
        assert_eq!(
            err,
            IllegalMove {
                index: 1,
                token: "e2e4".to_string()
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = translate("e4 hello").unwrap_err();
        assert_eq!(err.index, 1);
        assert!(err.to_string().contains("hello"));
    }

    #[test]
    fn empty_history_is_empty() {
        assert_eq!(translate("").unwrap(), Vec::<String>::new());
    }
}
