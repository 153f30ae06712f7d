//! Turn orchestration.
//!
//! The [`Agent`] owns the session and drives one user turn at a time: it
//! appends the user message, runs the model transport, feeds frames through
//! the [`StreamReconciler`], drains the turn's [`ToolCallRecorder`] into the
//! session and finally commits the reconciled assistant message. Any failure
//! between the user append and the commit rolls the session back to its
//! length before the turn.

use std::future::Future;

use crate::error::TurnError;
use crate::message::Message;
use crate::session::Session;
use crate::ui::render::RenderSink;

mod farewell;
pub mod reconcile;
pub mod recorder;
pub mod transport;

pub use farewell::{Farewell, FarewellSignal};
use reconcile::StreamReconciler;
use recorder::{ToolCallRecorder, ToolEvent};
use transport::{ModelTransport, TurnEvent};

/// Where the orchestrator is in its per-turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Submitting,
    Streaming,
    Reconciling,
    Committing,
    Idle,
    Terminated,
}

/// Result of a successfully committed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Keep reading input.
    Continue,
    /// A tool registered a farewell during the turn; the session should end.
    Farewell(Farewell),
}

/// Conversation orchestrator.
pub struct Agent {
    transport: Box<dyn ModelTransport>,
    session: Session,
    farewell: FarewellSignal,
    no_history: bool,
    state: TurnState,
}

impl Agent {
    /// `farewell` must be the handle shared with the farewell tool.
    pub fn new(transport: Box<dyn ModelTransport>, farewell: FarewellSignal) -> Self {
        Self {
            transport,
            session: Session::new(),
            farewell,
            no_history: false,
            state: TurnState::AwaitingInput,
        }
    }

    /// Forget the earlier conversation at the start of every turn. The last
    /// committed turn stays in the session until the next one begins.
    pub fn with_no_history(mut self, no_history: bool) -> Self {
        self.no_history = no_history;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Enter `AwaitingInput` for a new loop iteration.
    pub fn begin_iteration(&mut self) {
        self.state = TurnState::AwaitingInput;
    }

    /// Mark the conversation finished.
    pub fn terminate(&mut self) {
        self.state = TurnState::Terminated;
    }

    /// Run one turn without an external cancellation source.
    pub async fn run_turn(
        &mut self,
        input: &str,
        sink: &dyn RenderSink,
    ) -> Result<TurnOutcome, TurnError> {
        self.run_turn_with_cancel(input, sink, std::future::pending::<()>())
            .await
    }

    /// Run one turn; resolving `cancel` aborts it as [`TurnError::Interrupted`].
    pub async fn run_turn_with_cancel<C>(
        &mut self,
        input: &str,
        sink: &dyn RenderSink,
        cancel: C,
    ) -> Result<TurnOutcome, TurnError>
    where
        C: Future<Output = ()> + Send,
    {
        if self.no_history && !self.session.is_empty() {
            tracing::debug!(dropped = self.session.len(), "clearing history");
            self.session.clear();
        }
        let checkpoint = self.session.len();
        self.state = TurnState::Submitting;
        self.session.append(Message::user(input));
        tracing::debug!(checkpoint, "turn submitted");

        let recorder = ToolCallRecorder::new();
        let mut reconciler = StreamReconciler::new(self.transport.framing());
        self.state = TurnState::Streaming;

        let result = {
            let reconciler = &mut reconciler;
            let mut on_event = |event: TurnEvent| match event {
                TurnEvent::Frame(frame) => {
                    if let Some(delta) = reconciler.observe(frame) {
                        sink.assistant_delta(&delta);
                    }
                }
                TurnEvent::ToolCall { name, arguments } => sink.tool_call(&name, &arguments),
                TurnEvent::ToolResult { result, .. } => sink.tool_result(&result),
            };
            let run = self
                .transport
                .run(self.session.snapshot(), &recorder, &mut on_event);
            tokio::select! {
                result = run => result,
                // Cancellation drops the in-flight request and any tool call.
                _ = cancel => Err(TurnError::Interrupted),
            }
        };
        sink.end_assistant();

        if let Err(err) = result {
            return Err(self.roll_back(checkpoint, err));
        }

        self.state = TurnState::Reconciling;
        let reply = reconciler.finish();

        self.state = TurnState::Committing;
        let tool_events = recorder.drain();
        tracing::debug!(tool_events = tool_events.len(), "committing turn");
        for event in tool_events {
            self.session.append(ToolEvent::into_message(event));
        }
        match reply {
            Some(message) if !message.is_tool_only() => self.session.append(message),
            Some(_) => tracing::debug!("skipping tool-only assistant message"),
            None => tracing::debug!("model produced no assistant message"),
        }

        match self.farewell.consume() {
            Some(farewell) => {
                tracing::debug!("farewell registered");
                self.state = TurnState::Terminated;
                Ok(TurnOutcome::Farewell(farewell))
            }
            None => {
                self.state = TurnState::Idle;
                Ok(TurnOutcome::Continue)
            }
        }
    }

    fn roll_back(&mut self, checkpoint: usize, err: TurnError) -> TurnError {
        tracing::debug!(
            error = %err,
            discarded = self.session.len().saturating_sub(checkpoint),
            "turn failed; rolling back"
        );
        self.session.truncate_to(checkpoint);
        // A farewell raised by a turn that did not commit is dropped.
        if self.farewell.consume().is_some() {
            tracing::debug!("discarding farewell from failed turn");
        }
        self.state = TurnState::Idle;
        err
    }
}
