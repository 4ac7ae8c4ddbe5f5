//! Public analysis API.
//!
//! An [`EngineClient`] owns one engine through a background task. The task
//! is the only place the [`EngineSession`] is touched: submissions and
//! engine output are both funnelled into it and handled one at a time.
//! Callers wait on a per-request oneshot.

use crate::channel::EngineChannel;
use crate::config::EngineSettings;
use crate::position::{PositionBuilder, PositionSetup};
use crate::queue::EngineSession;
use crate::request::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, BestMove, Evaluation, SearchLimit,
};
use crate::translate::MoveTranslator;
use crate::{Color, EngineError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uci::GuiCommand;

/// Queued submissions waiting for the session task.
const SUBMISSION_CAPACITY: usize = 64;

/// Handle to a single analysis engine.
///
/// Cloning is cheap; clones share the same engine and queue. When the last
/// clone is dropped the engine is told to quit.
#[derive(Clone, Debug)]
pub struct EngineClient {
    submissions: Option<mpsc::Sender<AnalysisRequest>>,
    positions: PositionBuilder,
    timeout: Option<Duration>,
}

impl EngineClient {
    /// Launch the configured engine process.
    ///
    /// Launch failure is logged, not returned: the client is still built,
    /// and every request on it fails with [`EngineError::Unavailable`].
    pub fn launch(settings: &EngineSettings) -> Self {
        match EngineChannel::spawn(settings) {
            Ok(channel) => Self::connect(channel, settings.handshake_delay()),
            Err(e) => {
                tracing::error!(command = %settings.command, "Init failed: {}", e);
                Self::unavailable()
            }
        }
    }

    /// Drive an already-open channel. `uci` is sent after `handshake_delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(channel: EngineChannel, handshake_delay: Duration) -> Self {
        let (submissions, receiver) = mpsc::channel(SUBMISSION_CAPACITY);
        tokio::spawn(run_session(channel, receiver, handshake_delay));

        Self {
            submissions: Some(submissions),
            positions: PositionBuilder::default(),
            timeout: None,
        }
    }

    /// A client with no engine behind it.
    pub fn unavailable() -> Self {
        Self {
            submissions: None,
            positions: PositionBuilder::default(),
            timeout: None,
        }
    }

    /// Use a different move translator for move histories.
    pub fn with_translator(mut self, translator: Arc<dyn MoveTranslator>) -> Self {
        self.positions = PositionBuilder::new(translator);
        self
    }

    /// Give up waiting after `timeout`. The request itself stays queued
    /// until the engine answers it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether a session task is still accepting requests.
    pub fn is_available(&self) -> bool {
        self.submissions
            .as_ref()
            .is_some_and(|submissions| !submissions.is_closed())
    }

    /// The position builder used for move histories.
    pub fn positions(&self) -> &PositionBuilder {
        &self.positions
    }

    /// Search for the best move in `history` (a move list or a FEN).
    ///
    /// A history that cannot be set up yields [`BestMove::none`] without
    /// contacting the engine.
    pub async fn best_move(
        &self,
        limit: SearchLimit,
        history: &str,
        perspective: Color,
    ) -> Result<BestMove, EngineError> {
        match self.positions.build(history) {
            Ok(setup) => self.best_move_at(&setup, limit, perspective).await,
            Err(e) => {
                tracing::debug!("Skipping analysis: {}", e);
                Ok(BestMove::none())
            }
        }
    }

    /// Static evaluation of `history`.
    pub async fn evaluation(
        &self,
        history: &str,
        perspective: Color,
    ) -> Result<Evaluation, EngineError> {
        match self.positions.build(history) {
            Ok(setup) => self.evaluation_at(&setup, perspective).await,
            Err(e) => {
                tracing::debug!("Skipping evaluation: {}", e);
                Ok(Evaluation::none())
            }
        }
    }

    /// Best-move search on a prepared position.
    pub async fn best_move_at(
        &self,
        setup: &PositionSetup,
        limit: SearchLimit,
        perspective: Color,
    ) -> Result<BestMove, EngineError> {
        let outcome = self
            .submit(
                setup,
                limit.go_command(),
                AnalysisKind::BestMove,
                perspective,
            )
            .await?;
        match outcome {
            AnalysisOutcome::BestMove(result) => Ok(result),
            AnalysisOutcome::Evaluation(_) => Ok(BestMove::none()),
        }
    }

    /// Static evaluation on a prepared position.
    pub async fn evaluation_at(
        &self,
        setup: &PositionSetup,
        perspective: Color,
    ) -> Result<Evaluation, EngineError> {
        let outcome = self
            .submit(setup, GuiCommand::Eval, AnalysisKind::StaticEval, perspective)
            .await?;
        match outcome {
            AnalysisOutcome::Evaluation(result) => Ok(result),
            AnalysisOutcome::BestMove(result) => Ok(Evaluation {
                score: result.score,
            }),
        }
    }

    async fn submit(
        &self,
        setup: &PositionSetup,
        command: GuiCommand,
        kind: AnalysisKind,
        perspective: Color,
    ) -> Result<AnalysisOutcome, EngineError> {
        let submissions = self.submissions.as_ref().ok_or(EngineError::Unavailable)?;

        let (request, reply) = AnalysisRequest::new(
            Some(setup.command.clone()),
            command.to_uci(),
            kind,
            setup.side_to_move,
            perspective,
        );
        submissions
            .send(request)
            .await
            .map_err(|_| EngineError::Unavailable)?;

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, reply)
                .await
                .map_err(|_| EngineError::Timeout(limit))?,
            None => reply.await,
        };
        outcome.map_err(|_| EngineError::Unavailable)
    }
}

/// The session task: sole owner of the channel and the queue.
async fn run_session(
    mut channel: EngineChannel,
    mut submissions: mpsc::Receiver<AnalysisRequest>,
    handshake_delay: Duration,
) {
    let mut session = EngineSession::new();

    if !handshake_delay.is_zero() {
        tokio::time::sleep(handshake_delay).await;
    }
    if channel.send(&GuiCommand::Uci.to_uci()).await.is_err() {
        tracing::warn!("Engine closed before handshake");
        return;
    }

    loop {
        let commands = tokio::select! {
            request = submissions.recv() => match request {
                Some(request) => session.submit(request),
                None => break,
            },
            message = channel.recv() => match message {
                Some(message) => session.handle_message(&message),
                None => {
                    tracing::warn!(
                        pending = session.pending(),
                        ready = session.is_ready(),
                        "Engine output closed"
                    );
                    return;
                }
            },
        };

        for command in commands {
            if let Err(e) = channel.send(&command).await {
                tracing::warn!("Dropping session: {}", e);
                return;
            }
        }
    }

    tracing::debug!("All clients dropped, stopping engine");
    channel.shutdown().await;
}
