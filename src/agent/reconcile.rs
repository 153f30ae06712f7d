//! Stream reconciliation: turns model frames into printable deltas.
//!
//! Providers differ on whether a frame carries "all text so far" or only the
//! newest fragment. [`FramingMode::Inferred`] guesses per frame by prefix
//! containment:
//!
//! - frame extends what was printed: print the new suffix;
//! - frame is a prefix of what was printed: stale duplicate, print nothing;
//! - otherwise: treat the whole frame as new text and append it.
//!
//! The guess has a known blind spot: a genuine delta that happens to be a
//! prefix of the printed text (`"ha"` then `"h"`) is dropped. Transports that
//! know their framing should declare [`FramingMode::Cumulative`] or
//! [`FramingMode::Delta`] instead.

use crate::message::{Message, ToolInvocation};

/// One frame observed from the model transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    /// Either the cumulative text so far or only the newest fragment.
    pub text: String,
    /// Latest consolidated tool-call list, when the frame carries one.
    pub tool_calls: Option<Vec<ToolInvocation>>,
}

impl StreamEvent {
    /// Text-only frame.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: None,
        }
    }

    /// Frame reporting the current tool-call list alongside text.
    pub fn with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Some(tool_calls),
        }
    }
}

/// How frame text relates to previously observed frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramingMode {
    /// Decide per frame by prefix containment.
    #[default]
    Inferred,
    /// Every frame carries the full text so far.
    Cumulative,
    /// Every frame carries only new text.
    Delta,
}

/// Per-turn reconciliation state.
#[derive(Debug, Default)]
pub struct StreamReconciler {
    framing: FramingMode,
    /// Text already surfaced to the user.
    printed: String,
    /// Most recent non-empty frame text, verbatim.
    last_raw: String,
    last_tool_calls: Vec<ToolInvocation>,
}

impl StreamReconciler {
    pub fn new(framing: FramingMode) -> Self {
        Self {
            framing,
            ..Self::default()
        }
    }

    /// Text printed so far.
    pub fn printed(&self) -> &str {
        &self.printed
    }

    /// Feed one frame; returns the delta to print, if any.
    pub fn observe(&mut self, event: StreamEvent) -> Option<String> {
        if let Some(calls) = event.tool_calls {
            self.last_tool_calls = calls;
        }
        let text = event.text;
        if !text.is_empty() {
            self.last_raw.clone_from(&text);
        }

        let delta = match self.framing {
            FramingMode::Inferred => {
                if text.starts_with(self.printed.as_str()) {
                    let delta = text[self.printed.len()..].to_string();
                    self.printed = text;
                    delta
                } else if self.printed.starts_with(text.as_str()) {
                    String::new()
                } else {
                    self.printed.push_str(&text);
                    text
                }
            }
            FramingMode::Cumulative => {
                if text.starts_with(self.printed.as_str()) {
                    let delta = text[self.printed.len()..].to_string();
                    self.printed = text;
                    delta
                } else {
                    String::new()
                }
            }
            FramingMode::Delta => {
                self.printed.push_str(&text);
                text
            }
        };

        (!delta.is_empty()).then_some(delta)
    }

    /// Close the turn and build the assistant message, if there is one.
    pub fn finish(self) -> Option<Message> {
        let content = if self.printed.is_empty() {
            self.last_raw
        } else {
            self.printed
        };
        if content.is_empty() && self.last_tool_calls.is_empty() {
            return None;
        }
        Some(Message::Assistant {
            content,
            tool_invocations: self.last_tool_calls,
        })
    }
}
