//! One-shot farewell flag raised by the `register_farewell` tool.

use std::sync::{Arc, Mutex};

/// A registered farewell, with the optional note the model attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Farewell {
    pub note: Option<String>,
}

#[derive(Debug, Default)]
struct FarewellState {
    requested: bool,
    note: Option<String>,
}

/// Shared handle: the tool side calls [`register`](Self::register), the chat
/// loop calls [`consume`](Self::consume) once per iteration.
#[derive(Debug, Clone, Default)]
pub struct FarewellSignal {
    state: Arc<Mutex<FarewellState>>,
}

impl FarewellSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session as ending. A later registration replaces the note.
    pub fn register(&self, note: Option<String>) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.requested = true;
        state.note = note;
    }

    /// Observe and reset the flag.
    pub fn consume(&self) -> Option<Farewell> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if !state.requested {
            return None;
        }
        state.requested = false;
        Some(Farewell {
            note: state.note.take(),
        })
    }

    pub fn is_requested(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).requested
    }
}
