//! Line input for the chat loop.
//!
//! The loop only needs "next line, or why there isn't one". Ctrl-C while
//! waiting for input is reported as [`ReadOutcome::Cancelled`] so the caller
//! can re-prompt instead of exiting.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Result of reading one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// User submitted a full line (without its terminator).
    Line(String),
    /// End-of-file (`Ctrl-D` / closed stdin).
    Eof,
    /// User pressed `Ctrl-C` at the prompt.
    Cancelled,
}

/// Source of user input lines.
#[async_trait]
pub trait LineReader: Send {
    async fn read_line(&mut self) -> io::Result<ReadOutcome>;
}

/// Reads lines from stdin, racing each read against Ctrl-C.
pub struct StdinReader {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineReader for StdinReader {
    async fn read_line(&mut self) -> io::Result<ReadOutcome> {
        // `next_line` is cancel-safe: a line interrupted by Ctrl-C is not lost
        // from the buffer.
        tokio::select! {
            line = self.lines.next_line() => Ok(match line? {
                Some(line) => ReadOutcome::Line(line.trim_end_matches('\r').to_string()),
                None => ReadOutcome::Eof,
            }),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                Ok(ReadOutcome::Cancelled)
            }
        }
    }
}
