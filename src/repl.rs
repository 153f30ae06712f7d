//! Interactive chat loop.
//!
//! Reads one line at a time, hands non-empty input to the [`Agent`] and turns
//! turn failures into user-visible error lines. Nothing that happens inside a
//! turn ends the loop except a registered farewell.

use std::future::Future;
use std::io;

use crate::agent::{Agent, Farewell, TurnOutcome};
use crate::error::TurnError;
use crate::ui::input::{LineReader, ReadOutcome};
use crate::ui::render::RenderSink;

/// Inputs that end the conversation without a turn.
pub const EXIT_COMMANDS: [&str; 3] = ["/quit", "/exit", "/q"];

/// Hint shown when Ctrl-C arrives at the prompt.
const CANCELLED_INPUT_HINT: &str = "(Use /quit to exit)";

/// Why the chat loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed an exit command.
    Command,
    /// Input reached end-of-file.
    Eof,
    /// A tool registered a farewell during a committed turn.
    Farewell(Farewell),
}

/// True when `input` is one of [`EXIT_COMMANDS`], ignoring case and
/// surrounding whitespace.
pub fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&normalized.as_str())
}

/// User-visible line for a failed turn.
pub fn turn_error_line(err: &TurnError) -> String {
    match err {
        TurnError::Transport(e) => format!("[API error] {e}"),
        TurnError::Tool(e) => format!("[Tool error] {e}"),
        TurnError::MaxToolRounds(_) => format!("[Tool error] {err}"),
        TurnError::Interrupted => "[interrupted]".to_string(),
    }
}

/// Run the conversation until exit.
///
/// `interrupt` builds a fresh cancellation future for each turn; it resolves
/// when the user asks to abort the running turn.
pub async fn run_chat_loop<F, C>(
    agent: &mut Agent,
    input: &mut dyn LineReader,
    sink: &dyn RenderSink,
    mut interrupt: F,
) -> io::Result<LoopExit>
where
    F: FnMut() -> C,
    C: Future<Output = ()> + Send,
{
    loop {
        agent.begin_iteration();
        sink.prompt();
        let line = match input.read_line().await? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Eof => {
                // Finish the prompt line.
                sink.notice("");
                agent.terminate();
                return Ok(LoopExit::Eof);
            }
            ReadOutcome::Cancelled => {
                sink.notice("");
                sink.notice(CANCELLED_INPUT_HINT);
                continue;
            }
        };

        if is_exit_command(&line) {
            agent.terminate();
            return Ok(LoopExit::Command);
        }
        if line.trim().is_empty() {
            continue;
        }

        match agent.run_turn_with_cancel(&line, sink, interrupt()).await {
            Ok(TurnOutcome::Continue) => {}
            Ok(TurnOutcome::Farewell(farewell)) => {
                tracing::debug!(note = ?farewell.note, "ending chat on farewell");
                return Ok(LoopExit::Farewell(farewell));
            }
            Err(err) => {
                tracing::debug!(error = %err, "turn aborted");
                sink.error(&turn_error_line(&err));
            }
        }
    }
}

/// Cancellation future resolving on Ctrl-C.
///
/// If the signal handler cannot be installed the future never resolves, so a
/// turn is never spuriously interrupted.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
