//! Analysis requests and their results.

use crate::score::NO_SCORE;
use crate::Color;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uci::{GoOptions, GuiCommand, Score};

/// How long the engine may search for a best move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SearchLimit {
    /// Search to a fixed depth in plies.
    Depth(u32),
    /// Search for a fixed time in milliseconds.
    Time(u64),
}

impl Default for SearchLimit {
    fn default() -> Self {
        SearchLimit::Depth(15)
    }
}

impl SearchLimit {
    /// The `go` command enforcing this limit.
    pub fn go_command(self) -> GuiCommand {
        match self {
            SearchLimit::Depth(d) => GuiCommand::Go(GoOptions::depth(d)),
            SearchLimit::Time(ms) => GuiCommand::Go(GoOptions::movetime(ms)),
        }
    }
}

/// What the engine is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    BestMove,
    StaticEval,
}

/// Result of a best-move search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMove {
    /// Coordinate notation, or `None` when nothing usable came back.
    pub best_move: Option<String>,
    /// Display score from the requested perspective.
    pub score: String,
}

impl BestMove {
    /// The result used when analysis cannot run this cycle.
    pub fn none() -> Self {
        Self {
            best_move: None,
            score: NO_SCORE.to_string(),
        }
    }
}

/// Result of a static evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: String,
}

impl Evaluation {
    pub fn none() -> Self {
        Self {
            score: NO_SCORE.to_string(),
        }
    }
}

/// Value delivered to the caller when a request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    BestMove(BestMove),
    Evaluation(Evaluation),
}

/// One queued unit of work.
///
/// Lifecycle: pending in the queue, active once its commands are sent,
/// complete once its reply is delivered. A request is never reused.
#[derive(Debug)]
pub struct AnalysisRequest {
    /// `position ...` command, if the position has to be (re)set.
    pub setup: Option<String>,
    /// `go ...` or `eval`.
    pub command: String,
    pub kind: AnalysisKind,
    /// Side the raw engine score is relative to.
    pub side_to_move: Color,
    /// Side whose advantage positive scores mean.
    pub perspective: Color,
    pub(crate) output: Vec<String>,
    pub(crate) last_score: Option<Score>,
    pub(crate) eval_marker_seen: bool,
    reply: oneshot::Sender<AnalysisOutcome>,
}

impl AnalysisRequest {
    /// Create a request and the receiver its outcome will arrive on.
    pub fn new(
        setup: Option<String>,
        command: String,
        kind: AnalysisKind,
        side_to_move: Color,
        perspective: Color,
    ) -> (Self, oneshot::Receiver<AnalysisOutcome>) {
        let (reply, receiver) = oneshot::channel();
        let request = Self {
            setup,
            command,
            kind,
            side_to_move,
            perspective,
            output: Vec::new(),
            last_score: None,
            eval_marker_seen: false,
            reply,
        };
        (request, receiver)
    }

    /// Lines received while this request was active.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Commands to send when the request becomes active.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.setup
            .iter()
            .cloned()
            .chain(std::iter::once(self.command.clone()))
            .collect()
    }

    /// Deliver the outcome. The caller may have gone away; that is fine.
    pub(crate) fn complete(self, outcome: AnalysisOutcome) {
        let _ = self.reply.send(outcome);
    }
}
