//! Building the `position` command for an analysis request.
//!
//! Input is whatever the caller scraped from a game: either a complete FEN
//! record, or a whitespace-separated list of moves played from the standard
//! initial position.

use crate::translate::{IllegalMove, MoveTranslator, StandardTranslator};
use crate::Color;
use std::sync::Arc;
use thiserror::Error;
use uci::GuiCommand;

/// Errors that prevent a position from being set up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The move history contains a move that cannot be played.
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),
    /// A FEN was demanded but the input is blank.
    #[error("FEN is empty")]
    EmptyFen,
}

/// How to interpret the history string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionFormat {
    /// FEN if it looks like one, otherwise a move list.
    #[default]
    Auto,
    Fen,
    Moves,
}

/// A ready-to-send `position` command and whose turn it is there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSetup {
    pub command: String,
    pub side_to_move: Color,
}

/// Heuristic used by [`PositionFormat::Auto`]: a rank separator and more
/// than three space-separated fields.
pub fn looks_like_fen(input: &str) -> bool {
    input.contains('/') && input.split(' ').count() > 3
}

/// Turns move histories and FEN records into [`PositionSetup`]s.
#[derive(Clone)]
pub struct PositionBuilder {
    translator: Arc<dyn MoveTranslator>,
}

impl Default for PositionBuilder {
    fn default() -> Self {
        Self::new(Arc::new(StandardTranslator))
    }
}

impl std::fmt::Debug for PositionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionBuilder").finish_non_exhaustive()
    }
}

impl PositionBuilder {
    pub fn new(translator: Arc<dyn MoveTranslator>) -> Self {
        Self { translator }
    }

    /// Build a position, detecting the input format.
    ///
    /// An empty (or blank) history is the initial position with White to
    /// move and is not an error.
    pub fn build(&self, history: &str) -> Result<PositionSetup, PositionError> {
        self.build_as(history, PositionFormat::Auto)
    }

    /// Build a position with an explicit input format.
    pub fn build_as(
        &self,
        history: &str,
        format: PositionFormat,
    ) -> Result<PositionSetup, PositionError> {
        let is_fen = match format {
            PositionFormat::Auto => looks_like_fen(history),
            PositionFormat::Fen => true,
            PositionFormat::Moves => false,
        };

        if is_fen {
            self.from_fen(history)
        } else {
            self.from_moves(history)
        }
    }

    fn from_fen(&self, fen: &str) -> Result<PositionSetup, PositionError> {
        let fen = fen.trim();
        if fen.is_empty() {
            return Err(PositionError::EmptyFen);
        }

        let side_to_move = Color::from_fen_field(fen.split(' ').nth(1));
        let command = GuiCommand::Position {
            fen: Some(fen.to_string()),
            moves: Vec::new(),
        };

        Ok(PositionSetup {
            command: command.to_uci(),
            side_to_move,
        })
    }

    fn from_moves(&self, history: &str) -> Result<PositionSetup, PositionError> {
        let tokens: Vec<&str> = history.split_whitespace().collect();
        let moves = self.translator.translate(&tokens)?;
        let side_to_move = Color::after_plies(moves.len());
        let command = GuiCommand::Position { fen: None, moves };

        Ok(PositionSetup {
            command: command.to_uci(),
            side_to_move,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shakmaty::{Chess, Position};

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn empty_history_is_initial_position() {
        let setup = PositionBuilder::default().build("").unwrap();
        assert_eq!(setup.command, "position startpos");
        assert_eq!(setup.side_to_move, Color::White);

        let blank = PositionBuilder::default().build("   ").unwrap();
        assert_eq!(blank, setup);
    }

    #[test]
    fn move_history_is_translated() {
        let setup = PositionBuilder::default().build("e4 e5 Nf3").unwrap();
        assert_eq!(setup.command, "position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(setup.side_to_move, Color::Black);
    }

    #[test]
    fn fen_is_passed_verbatim() {
        let setup = PositionBuilder::default().build(AFTER_E4).unwrap();
        assert_eq!(setup.command, format!("position fen {}", AFTER_E4));
        assert_eq!(setup.side_to_move, Color::Black);
    }

    #[test]
    fn four_field_fen_uses_side_field() {
        // Four fields, no move counters: the side field alone decides.
        let fen = "8/8/8/8/8/8/8/K6k b - -";
        let setup = PositionBuilder::default().build(fen).unwrap();
        assert_eq!(setup.side_to_move, Color::Black);
    }

    #[test]
    fn malformed_fen_side_defaults_to_white() {
        let fen = "8/8/8/8/8/8/8/K6k x - - 0 1";
        let setup = PositionBuilder::default().build(fen).unwrap();
        assert_eq!(setup.side_to_move, Color::White);
    }

    #[test]
    fn slash_with_few_fields_is_a_move_list() {
        let err = PositionBuilder::default().build("e4 1/2").unwrap_err();
        assert!(matches!(err, PositionError::IllegalMove(_)));
    }

    #[test]
    fn illegal_history_fails() {
        let err = PositionBuilder::default().build("e2e4 e2e4").unwrap_err();
        assert_eq!(
            err,
            PositionError::IllegalMove(IllegalMove {
                index: 1,
                token: "e2e4".to_string()
            })
        );
    }

    #[test]
    fn explicit_format_overrides_detection() {
        let builder = PositionBuilder::default();
        assert_eq!(
            builder.build_as("", PositionFormat::Fen).unwrap_err(),
            PositionError::EmptyFen
        );
        assert!(builder.build_as(AFTER_E4, PositionFormat::Moves).is_err());
    }

    proptest! {
        #[test]
        fn side_to_move_follows_ply_parity(choices in proptest::collection::vec(any::<usize>(), 0..40)) {
            // Play a random legal game, then feed its coordinate moves back in.
            let mut position = Chess::default();
            let mut played = Vec::new();
            for choice in choices {
                let legal = position.legal_moves();
                if legal.is_empty() {
                    break;
                }
                let m = legal[choice % legal.len()].clone();
                played.push(m.to_uci(shakmaty::CastlingMode::Standard).to_string());
                position.play_unchecked(&m);
            }

            let setup = PositionBuilder::default().build(&played.join(" ")).unwrap();
            let expected = if played.len() % 2 == 0 { Color::White } else { Color::Black };
            prop_assert_eq!(setup.side_to_move, expected);
        }
    }
}
