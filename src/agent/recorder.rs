//! Tool call/result capture with explicit correlation ids.
//!
//! Tool execution pushes events into a [`ToolCallRecorder`] while the model
//! transport is still running; the orchestrator drains them once per turn and
//! folds them into the session. The recorder is a cheap cloneable handle, so
//! the producing side never needs access to the session itself.

use crate::message::{Message, ToolInvocation};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Opaque identifier linking a tool call to its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(String);

impl CallId {
    /// Allocate a fresh random id (`call_` + 16 hex digits).
    pub fn fresh() -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self(format!("call_{:016x}", u64::from_be_bytes(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEventKind {
    Call,
    Result,
}

/// One recorded half of a tool round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEvent {
    pub correlation_id: CallId,
    pub tool_name: String,
    pub kind: ToolEventKind,
    /// Arguments JSON for calls, result JSON for results.
    pub payload: String,
}

impl ToolEvent {
    /// Session message for this event: a single-invocation assistant message
    /// for calls, a tool result message for results.
    pub fn into_message(self) -> Message {
        match self.kind {
            ToolEventKind::Call => Message::Assistant {
                content: String::new(),
                tool_invocations: vec![ToolInvocation::new(
                    self.correlation_id.0,
                    self.tool_name,
                    self.payload,
                )],
            },
            ToolEventKind::Result => {
                Message::tool_result(self.correlation_id.0, self.tool_name, self.payload)
            }
        }
    }
}

/// Order-preserving, drainable buffer of [`ToolEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct ToolCallRecorder {
    events: Arc<Mutex<Vec<ToolEvent>>>,
}

impl ToolCallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ToolEvent>> {
        // A panicking producer cannot leave the Vec half-written.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an outgoing call and return the id its result must carry.
    pub fn record_call(&self, name: &str, arguments: &str) -> CallId {
        let id = CallId::fresh();
        tracing::debug!(tool = name, id = %id, "recorded tool call");
        self.lock().push(ToolEvent {
            correlation_id: id.clone(),
            tool_name: name.to_string(),
            kind: ToolEventKind::Call,
            payload: arguments.to_string(),
        });
        id
    }

    /// Record a result for `call`. Without a call id a fresh one is
    /// synthesized so the result is still kept.
    pub fn record_result(&self, call: Option<&CallId>, name: &str, result: &str) -> CallId {
        let id = match call {
            Some(id) => id.clone(),
            None => {
                let id = CallId::fresh();
                tracing::warn!(tool = name, id = %id, "tool result without a recorded call");
                id
            }
        };
        tracing::debug!(tool = name, id = %id, "recorded tool result");
        self.lock().push(ToolEvent {
            correlation_id: id.clone(),
            tool_name: name.to_string(),
            kind: ToolEventKind::Result,
            payload: result.to_string(),
        });
        id
    }

    /// Take every buffered event in arrival order, leaving the buffer empty.
    pub fn drain(&self) -> Vec<ToolEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
