//! The job queue: one engine, one request in flight.
//!
//! [`EngineSession`] is a pure state machine. It never performs I/O; every
//! transition returns the commands that must be written to the engine, in
//! order. The client task owns the session and does the writing.

use crate::request::{AnalysisKind, AnalysisOutcome, AnalysisRequest, BestMove, Evaluation};
use crate::score;
use std::collections::VecDeque;
use uci::{EngineMessage, Score};

/// Marker that opens the evaluation table printed by `eval`.
const TOTAL_EVALUATION: &str = "Total Evaluation";
/// Summary line printed by `eval` in newer engines.
const FINAL_EVALUATION: &str = "Final evaluation";

/// Engine-wide state for one client.
///
/// The head of the queue is active exactly when `busy` is set. Requests
/// behind it are untouched until they reach the head.
#[derive(Debug, Default)]
pub struct EngineSession {
    handshake_complete: bool,
    busy: bool,
    queue: VecDeque<AnalysisRequest>,
    engine_name: Option<String>,
}

impl EngineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// `uciok` has been received.
    pub fn is_ready(&self) -> bool {
        self.handshake_complete
    }

    /// A request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Requests not yet completed, including the active one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Name reported by the engine's `id name` line, if any.
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// Enqueue a request and activate it if the engine is idle.
    pub fn submit(&mut self, request: AnalysisRequest) -> Vec<String> {
        self.queue.push_back(request);
        self.advance()
    }

    /// Handle one message from the engine, which may hold several lines.
    pub fn handle_message(&mut self, message: &str) -> Vec<String> {
        let mut commands = Vec::new();
        for line in message.split('\n') {
            commands.extend(self.handle_line(line));
        }
        commands
    }

    /// Handle one line of engine output.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        tracing::trace!(line, "engine output");

        let message = EngineMessage::parse(line);
        match &message {
            EngineMessage::UciOk => {
                self.handshake_complete = true;
                tracing::info!(
                    engine = self.engine_name.as_deref().unwrap_or("unknown"),
                    "Engine ready"
                );
                return self.advance();
            }
            EngineMessage::ReadyOk => return Vec::new(),
            EngineMessage::Id { name: Some(name), .. } if !self.handshake_complete => {
                self.engine_name = Some(name.clone());
            }
            _ => {}
        }

        if !self.busy {
            return Vec::new();
        }
        let Some(active) = self.queue.front_mut() else {
            return Vec::new();
        };

        active.output.push(line.to_string());
        if let Some(score) = Score::last_in(line) {
            active.last_score = Some(score);
        }

        let outcome = match active.kind {
            AnalysisKind::BestMove => match message {
                EngineMessage::BestMove { mv, .. } => {
                    let score = score::display(
                        active.last_score,
                        active.side_to_move,
                        active.perspective,
                    );
                    Some(AnalysisOutcome::BestMove(BestMove {
                        best_move: mv,
                        score,
                    }))
                }
                _ => None,
            },
            AnalysisKind::StaticEval => {
                if eval_finished(&mut active.eval_marker_seen, line) {
                    // Numeric extraction from the evaluation table is a known gap.
                    Some(AnalysisOutcome::Evaluation(Evaluation::none()))
                } else {
                    None
                }
            }
        };

        match outcome {
            Some(outcome) => self.complete(outcome),
            None => Vec::new(),
        }
    }

    fn complete(&mut self, outcome: AnalysisOutcome) -> Vec<String> {
        if let Some(request) = self.queue.pop_front() {
            tracing::debug!(
                kind = ?request.kind,
                lines = request.output.len(),
                outcome = ?outcome,
                "Request complete"
            );
            request.complete(outcome);
        }
        self.busy = false;
        self.advance()
    }

    fn advance(&mut self) -> Vec<String> {
        if self.busy || !self.handshake_complete {
            return Vec::new();
        }
        let Some(next) = self.queue.front() else {
            return Vec::new();
        };

        self.busy = true;
        let commands = next.commands();
        tracing::debug!(commands = ?commands, queued = self.queue.len() - 1, "Activating request");
        commands
    }
}

/// Completion test for `eval` output.
///
/// Done on a line containing "Final evaluation", or once "Total Evaluation"
/// has been followed by any further text (on its own line or later ones).
fn eval_finished(marker_seen: &mut bool, line: &str) -> bool {
    if line.contains(FINAL_EVALUATION) || *marker_seen {
        return true;
    }
    match line.find(TOTAL_EVALUATION) {
        Some(at) => {
            *marker_seen = true;
            !line[at + TOTAL_EVALUATION.len()..].is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use tokio::sync::oneshot;

    fn best_move_request(
        setup: &str,
        side: Color,
        perspective: Color,
    ) -> (AnalysisRequest, oneshot::Receiver<AnalysisOutcome>) {
        AnalysisRequest::new(
            Some(setup.to_string()),
            "go depth 10".to_string(),
            AnalysisKind::BestMove,
            side,
            perspective,
        )
    }

    fn eval_request() -> (AnalysisRequest, oneshot::Receiver<AnalysisOutcome>) {
        AnalysisRequest::new(
            Some("position startpos".to_string()),
            "eval".to_string(),
            AnalysisKind::StaticEval,
            Color::White,
            Color::White,
        )
    }

    fn ready_session() -> EngineSession {
        let mut session = EngineSession::new();
        assert!(session.handle_line("uciok").is_empty());
        session
    }

    #[test]
    fn nothing_is_sent_before_handshake() {
        let mut session = EngineSession::new();
        let (request, _rx) = best_move_request("position startpos", Color::White, Color::White);

        assert!(session.submit(request).is_empty());
        assert!(!session.is_busy());
        assert_eq!(session.pending(), 1);

        let commands = session.handle_line("uciok");
        assert_eq!(commands, vec!["position startpos", "go depth 10"]);
        assert!(session.is_ready());
        assert!(session.is_busy());
    }

    #[test]
    fn requests_run_one_at_a_time_in_order() {
        let mut session = EngineSession::new();
        let (a, mut rx_a) = best_move_request("position startpos", Color::White, Color::White);
        let (b, mut rx_b) =
            best_move_request("position startpos moves e2e4", Color::Black, Color::White);

        assert!(session.submit(a).is_empty());
        assert!(session.submit(b).is_empty());

        assert_eq!(
            session.handle_line("uciok"),
            vec!["position startpos", "go depth 10"]
        );
        assert!(session.handle_line("info depth 10 score cp 30 pv e2e4").is_empty());
        assert!(rx_b.try_recv().is_err());

        let next = session.handle_line("bestmove e2e4 ponder e7e5");
        assert_eq!(next, vec!["position startpos moves e2e4", "go depth 10"]);
        assert_eq!(
            rx_a.try_recv().unwrap(),
            AnalysisOutcome::BestMove(BestMove {
                best_move: Some("e2e4".to_string()),
                score: "+0.30".to_string()
            })
        );
        assert!(rx_b.try_recv().is_err());

        assert!(session
            .handle_message("info depth 10 score cp 25\nbestmove e7e5\n")
            .is_empty());
        assert_eq!(
            rx_b.try_recv().unwrap(),
            AnalysisOutcome::BestMove(BestMove {
                best_move: Some("e7e5".to_string()),
                score: "-0.25".to_string()
            })
        );
        assert!(!session.is_busy());
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn last_score_annotation_wins() {
        let mut session = ready_session();
        let (request, mut rx) = best_move_request("position startpos", Color::White, Color::White);
        session.submit(request);

        session.handle_message(
            "info depth 1 score cp 10\ninfo depth 2 score mate 2\ninfo depth 3 score cp -45 pv d2d4\n",
        );
        session.handle_line("info string NNUE evaluation enabled");
        session.handle_line("bestmove d2d4");

        match rx.try_recv().unwrap() {
            AnalysisOutcome::BestMove(result) => assert_eq!(result.score, "-0.45"),
            other => panic!("Expected BestMove, got {:?}", other),
        }
    }

    #[test]
    fn multi_line_message_completes_request() {
        let mut session = ready_session();
        let (request, mut rx) = best_move_request("position startpos", Color::White, Color::White);
        session.submit(request);

        session.handle_message("info depth 1\nbestmove e2e4\n");

        assert_eq!(
            rx.try_recv().unwrap(),
            AnalysisOutcome::BestMove(BestMove {
                best_move: Some("e2e4".to_string()),
                score: "0.00".to_string()
            })
        );
    }

    #[test]
    fn unparseable_bestmove_yields_null_move() {
        let mut session = ready_session();
        let (request, mut rx) = best_move_request("position startpos", Color::White, Color::White);
        session.submit(request);

        session.handle_line("info depth 0 score mate 0");
        session.handle_line("bestmove (none)");

        assert_eq!(
            rx.try_recv().unwrap(),
            AnalysisOutcome::BestMove(BestMove {
                best_move: None,
                score: "-M0".to_string()
            })
        );
        assert!(!session.is_busy());
    }

    #[test]
    fn chatter_without_active_request_is_discarded() {
        let mut session = EngineSession::new();
        session.handle_line("id name Stockfish 16");
        session.handle_line("option name Hash type spin default 16 min 1 max 33554432");
        let (request, mut rx) = best_move_request("position startpos", Color::White, Color::White);
        session.submit(request);

        // A stray bestmove before activation must not complete the request.
        assert!(session.handle_line("bestmove a2a3").is_empty());
        assert!(rx.try_recv().is_err());

        session.handle_line("uciok");
        assert_eq!(session.engine_name(), Some("Stockfish 16"));
        session.handle_line("readyok");
        session.handle_line("bestmove g1f3");

        match rx.try_recv().unwrap() {
            AnalysisOutcome::BestMove(result) => {
                assert_eq!(result.best_move.as_deref(), Some("g1f3"))
            }
            other => panic!("Expected BestMove, got {:?}", other),
        }
    }

    #[test]
    fn handshake_tokens_are_not_buffered() {
        let mut session = ready_session();
        let (request, _rx) = best_move_request("position startpos", Color::White, Color::White);
        session.submit(request);

        session.handle_message("readyok\n\n  \ninfo depth 1 score cp 3\n");

        let active = session.queue.front().unwrap();
        assert_eq!(active.output(), ["info depth 1 score cp 3"]);
    }

    #[test]
    fn abandoned_request_still_completes() {
        let mut session = ready_session();
        let (a, rx_a) = best_move_request("position startpos", Color::White, Color::White);
        let (b, mut rx_b) = best_move_request("position startpos", Color::White, Color::Black);
        session.submit(a);
        session.submit(b);
        drop(rx_a);

        let next = session.handle_line("bestmove e2e4");
        assert_eq!(next.len(), 2);
        session.handle_line("info depth 5 score cp 50");
        session.handle_line("bestmove e2e4");

        match rx_b.try_recv().unwrap() {
            AnalysisOutcome::BestMove(result) => assert_eq!(result.score, "-0.50"),
            other => panic!("Expected BestMove, got {:?}", other),
        }
    }

    #[test]
    fn eval_completes_on_final_evaluation() {
        let mut session = ready_session();
        let (request, mut rx) = eval_request();
        assert_eq!(session.submit(request), vec!["position startpos", "eval"]);

        session.handle_line("     Term    |    White    |    Black    |    Total");
        assert!(rx.try_recv().is_err());
        session.handle_line("Final evaluation       +0.09 (white side) [with scaled NNUE, ...]");

        assert_eq!(
            rx.try_recv().unwrap(),
            AnalysisOutcome::Evaluation(Evaluation {
                score: "0.00".to_string()
            })
        );
    }

    #[test]
    fn eval_completes_after_total_evaluation_block() {
        let mut session = ready_session();
        let (request, mut rx) = eval_request();
        session.submit(request);

        session.handle_line("Total Evaluation");
        assert!(rx.try_recv().is_err());
        session.handle_line("0.13 (white side)");
        assert!(rx.try_recv().is_ok());

        let (request, mut rx) = eval_request();
        session.submit(request);
        session.handle_line("Total Evaluation: 0.13 (white side)");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn eval_ignores_score_annotations() {
        let mut session = ready_session();
        let (request, mut rx) = eval_request();
        session.submit(request);

        session.handle_message("info string eval score cp 42\nFinal evaluation +0.42\n");

        assert_eq!(
            rx.try_recv().unwrap(),
            AnalysisOutcome::Evaluation(Evaluation::none())
        );
    }

    #[test]
    fn bestmove_does_not_complete_eval_request() {
        let mut session = ready_session();
        let (request, mut rx) = eval_request();
        session.submit(request);

        session.handle_line("bestmove e2e4");
        assert!(rx.try_recv().is_err());
        assert!(session.is_busy());
    }
}
