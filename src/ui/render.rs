//! Rendering contract and the default terminal renderer.
//!
//! `RenderSink` is the UI contract consumed by the chat loop and the turn
//! orchestrator. `Renderer` is the terminal implementation; tests substitute
//! a recording sink or point the renderer at an in-memory writer.

use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use std::sync::Mutex;

const USER_COLOR: Color = Color::Magenta;
const ASSISTANT_COLOR: Color = Color::Cyan;
const TOOL_COLOR: Color = Color::Yellow;

const USER_LABEL: &str = "You>";
const ASSISTANT_LABEL: &str = "AI>";

/// Injectable rendering interface used by orchestration code.
pub trait RenderSink: Send + Sync {
    /// Render the interactive input prompt.
    fn prompt(&self);
    /// Render a piece of streamed assistant text, opening the assistant line
    /// first when needed.
    fn assistant_delta(&self, text: &str);
    /// Terminate the assistant line if one is open.
    fn end_assistant(&self);
    /// Render a tool invocation.
    fn tool_call(&self, name: &str, arguments: &str);
    /// Render a tool result.
    fn tool_result(&self, result: &str);
    /// Render a styled informational line (startup banner, config path).
    fn info(&self, msg: &str);
    /// Render a plain line (hints, closing message).
    fn notice(&self, msg: &str);
    /// Render a user-visible error line.
    fn error(&self, msg: &str);
}

struct Output {
    writer: Box<dyn Write + Send>,
    /// Whether an assistant line has been opened and not yet terminated.
    line_open: bool,
}

/// Terminal renderer writing ANSI-styled chat output.
pub struct Renderer {
    color: bool,
    out: Mutex<Output>,
}

impl Renderer {
    /// Renderer writing to stdout.
    pub fn new(color: bool) -> Self {
        Self::with_writer(color, Box::new(io::stdout()))
    }

    /// Renderer writing to an arbitrary sink.
    pub fn with_writer(color: bool, writer: Box<dyn Write + Send>) -> Self {
        Self {
            color,
            out: Mutex::new(Output {
                writer,
                line_open: false,
            }),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn with_output(&self, f: impl FnOnce(&mut Output) -> io::Result<()>) {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        // Terminal write failures (closed pipe) are not actionable mid-chat.
        if let Err(e) = f(&mut out).and_then(|()| out.writer.flush()) {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }

    /// Write a full line, closing any open assistant line first.
    fn line(&self, text: String) {
        self.with_output(|out| {
            if out.line_open {
                out.line_open = false;
                writeln!(out.writer)?;
            }
            writeln!(out.writer, "{text}")
        });
    }
}

impl RenderSink for Renderer {
    fn prompt(&self) {
        let label = self.paint(USER_LABEL, USER_COLOR);
        self.with_output(|out| write!(out.writer, "{label} "));
    }

    fn assistant_delta(&self, text: &str) {
        self.with_output(|out| {
            let mut text = text;
            if !out.line_open {
                out.line_open = true;
                // A later round's text starts fresh on its own line.
                text = text.trim_start_matches('\n');
                write!(out.writer, "{} ", self.paint(ASSISTANT_LABEL, ASSISTANT_COLOR))?;
            }
            write!(out.writer, "{}", self.paint(text, ASSISTANT_COLOR))
        });
    }

    fn end_assistant(&self) {
        self.with_output(|out| {
            if out.line_open {
                out.line_open = false;
                writeln!(out.writer)?;
            }
            Ok(())
        });
    }

    fn tool_call(&self, name: &str, arguments: &str) {
        self.line(self.paint(&format!("[tool-call] {name}({arguments})"), TOOL_COLOR));
    }

    fn tool_result(&self, result: &str) {
        self.line(self.paint(&format!("[tool-result] {result}"), TOOL_COLOR));
    }

    fn info(&self, msg: &str) {
        self.line(self.paint(msg, TOOL_COLOR));
    }

    fn notice(&self, msg: &str) {
        self.line(msg.to_string());
    }

    fn error(&self, msg: &str) {
        self.line(msg.to_string());
    }
}
