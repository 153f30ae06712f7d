//! Shared test fixtures for config, tool and transport test modules.
//!
//! Keeping tiny but reusable helpers here prevents each test module from
//! rebuilding ad-hoc temp dir, SSE and HTTP stub code.

use crate::ui::input::{LineReader, ReadOutcome};
use crate::ui::render::RenderSink;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncReadExt;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!(
            "chat-cli-{prefix}-{}-{millis}-{suffix}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Build one SSE block carrying a single `data:` line.
pub fn sse_data_block(data: &str) -> String {
    format!("data: {data}\n\n")
}

/// SSE stream terminator block used by OpenAI-compatible streams.
pub fn sse_done_block() -> &'static str {
    "data: [DONE]\n\n"
}

/// Read one HTTP/1.1 request (headers plus `Content-Length` body) from a
/// stub-server connection.
pub async fn read_http_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Render sink that records every call as a tagged line.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }

    /// Everything rendered so far, one entry per sink call.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Concatenation of all assistant deltas.
    pub fn assistant_text(&self) -> String {
        self.lines()
            .iter()
            .filter_map(|line| line.strip_prefix("delta:"))
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn prompt(&self) {
        self.push("prompt".into());
    }
    fn assistant_delta(&self, text: &str) {
        self.push(format!("delta:{text}"));
    }
    fn end_assistant(&self) {
        self.push("end".into());
    }
    fn tool_call(&self, name: &str, arguments: &str) {
        self.push(format!("tool-call:{name}({arguments})"));
    }
    fn tool_result(&self, result: &str) {
        self.push(format!("tool-result:{result}"));
    }
    fn info(&self, msg: &str) {
        self.push(format!("info:{msg}"));
    }
    fn notice(&self, msg: &str) {
        self.push(format!("notice:{msg}"));
    }
    fn error(&self, msg: &str) {
        self.push(format!("error:{msg}"));
    }
}

/// Line reader replaying scripted outcomes, then reporting EOF.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    outcomes: VecDeque<ReadOutcome>,
}

impl ScriptedLines {
    /// Reader yielding each string as a submitted line.
    pub fn lines(lines: &[&str]) -> Self {
        Self::outcomes(lines.iter().map(|l| ReadOutcome::Line(l.to_string())).collect())
    }

    pub fn outcomes(outcomes: Vec<ReadOutcome>) -> Self {
        Self {
            outcomes: outcomes.into(),
        }
    }
}

#[async_trait]
impl LineReader for ScriptedLines {
    async fn read_line(&mut self) -> std::io::Result<ReadOutcome> {
        Ok(self.outcomes.pop_front().unwrap_or(ReadOutcome::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[test]
    fn sse_helpers_emit_expected_wire_format() {
        let block = sse_data_block(r#"{"choices":[]}"#);
        assert!(block.starts_with("data: {"));
        assert!(block.ends_with("\n\n"));
        assert_eq!(sse_done_block(), "data: [DONE]\n\n");
    }
}
