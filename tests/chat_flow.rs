//! End-to-end turns against a local OpenAI-compatible stub server.
//!
//! Each test binds a `TcpListener`, scripts one HTTP response per request,
//! and drives the real `ApiClient` + `ToolLoopTransport` + `Agent` stack.

use chat_cli::agent::transport::ToolLoopTransport;
use chat_cli::agent::{Agent, FarewellSignal, TurnOutcome};
use chat_cli::api::ApiClient;
use chat_cli::config::ApiConfig;
use chat_cli::error::{ApiError, TurnError};
use chat_cli::message::Message;
use chat_cli::tools::ToolRegistry;
use chat_cli::transcript;
use chat_cli::types::Role;
use chat_cli::ui::render::RenderSink;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

enum Reply {
    Sse(Vec<&'static str>),
    Status(&'static str, &'static str),
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Serve one scripted reply per connection; yields the raw requests.
async fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for reply in replies {
            let (mut stream, _) = listener.accept().await.expect("accept");
            requests.push(read_request(&mut stream).await);
            let (status, content_type, body) = match reply {
                Reply::Sse(payloads) => {
                    let mut body: String =
                        payloads.iter().map(|p| format!("data: {p}\n\n")).collect();
                    body.push_str("data: [DONE]\n\n");
                    ("200 OK", "text/event-stream", body)
                }
                Reply::Status(status, body) => (status, "application/json", body.to_string()),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
        requests
    });
    (base_url, handle)
}

fn agent_for(base_url: String) -> Agent {
    let farewell = FarewellSignal::new();
    let api = ApiConfig {
        base_url,
        api_key: "sk-test".into(),
        model: "stub-model".into(),
        temperature: 0.5,
    };
    let transport = ToolLoopTransport::new(
        Box::new(ApiClient::new(&api, Duration::from_secs(5))),
        ToolRegistry::with_builtins(farewell.clone()),
        api.model.clone(),
        api.temperature,
    );
    Agent::new(Box::new(transport), farewell)
}

// ---------------------------------------------------------------------------
// Render capture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Captured {
    lines: Mutex<Vec<String>>,
}

impl Captured {
    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
    fn deltas(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix("delta:").map(str::to_string))
            .collect()
    }
}

impl RenderSink for Captured {
    fn prompt(&self) {}
    fn assistant_delta(&self, text: &str) {
        self.push(format!("delta:{text}"));
    }
    fn end_assistant(&self) {}
    fn tool_call(&self, name: &str, arguments: &str) {
        self.push(format!("call:{name}:{arguments}"));
    }
    fn tool_result(&self, result: &str) {
        self.push(format!("result:{result}"));
    }
    fn info(&self, _msg: &str) {}
    fn notice(&self, _msg: &str) {}
    fn error(&self, msg: &str) {
        self.push(format!("error:{msg}"));
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn streamed_reply_is_printed_incrementally_and_committed() {
    let (base_url, server) = serve(vec![Reply::Sse(vec![
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"H"}}]}"#,
        r#"{"choices":[{"index":0,"delta":{"content":"ello"}}]}"#,
        r#"{"choices":[{"index":0,"delta":{"content":"!"},"finish_reason":"stop"}]}"#,
    ])])
    .await;
    let mut agent = agent_for(base_url);
    let sink = Captured::default();

    let outcome = agent.run_turn("hi", &sink).await.expect("turn");
    assert_eq!(outcome, TurnOutcome::Continue);
    assert_eq!(sink.deltas(), vec!["H", "ello", "!"]);
    assert_eq!(
        agent.session().snapshot(),
        &[Message::user("hi"), Message::assistant("Hello!")]
    );

    let requests = server.await.unwrap();
    assert!(requests[0].contains(r#""stream":true"#));
    assert!(requests[0].contains(r#""tool_choice":"auto""#));
    assert!(requests[0].to_lowercase().contains("authorization: bearer sk-test"));
}

#[tokio::test]
async fn fragmented_tool_call_runs_and_commits_in_wire_order() {
    let (base_url, server) = serve(vec![
        Reply::Sse(vec![
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_model","type":"function","function":{"name":"get_current_time","arguments":"{\"timez"}}]}}]}"#,
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"one\":\"UTC\"}"}}]}}]}"#,
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
        ]),
        Reply::Sse(vec![
            r#"{"choices":[{"index":0,"delta":{"content":"It is late."},"finish_reason":"stop"}]}"#,
        ]),
    ])
    .await;
    let mut agent = agent_for(base_url);
    let sink = Captured::default();

    agent.run_turn("what time is it?", &sink).await.expect("turn");

    let messages = agent.session().snapshot();
    let roles: Vec<Role> = messages.iter().map(Message::role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    let invocation = &messages[1].tool_invocations()[0];
    assert_eq!(invocation.name, "get_current_time");
    assert_eq!(invocation.arguments, r#"{"timezone":"UTC"}"#);
    match &messages[2] {
        Message::ToolResult {
            tool_call_id,
            result,
            ..
        } => {
            assert_eq!(tool_call_id, &invocation.id);
            assert!(result.contains(r#""timezone":"UTC""#), "got: {result}");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert_eq!(messages[3], Message::assistant("It is late."));
    assert!(sink
        .lines()
        .contains(&r#"call:get_current_time:{"timezone":"UTC"}"#.to_string()));

    // The follow-up request replays the model's own call id.
    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].contains(r#""tool_call_id":"call_model""#));
}

#[tokio::test]
async fn server_error_rolls_back_the_turn() {
    let (base_url, _server) = serve(vec![
        Reply::Sse(vec![
            r#"{"choices":[{"index":0,"delta":{"content":"first"},"finish_reason":"stop"}]}"#,
        ]),
        Reply::Status("500 Internal Server Error", r#"{"error":"boom"}"#),
    ])
    .await;
    let mut agent = agent_for(base_url);
    let sink = Captured::default();

    agent.run_turn("one", &sink).await.expect("first turn");
    assert_eq!(agent.session().len(), 2);

    let err = agent.run_turn("two", &sink).await.unwrap_err();
    match err {
        TurnError::Transport(ApiError::Status { code, .. }) => assert_eq!(code, 500),
        other => panic!("expected transport error, got {other}"),
    }
    assert_eq!(agent.session().len(), 2);
}

#[tokio::test]
async fn error_payload_mid_stream_rolls_back_the_turn() {
    let (base_url, _server) = serve(vec![Reply::Sse(vec![
        r#"{"choices":[{"index":0,"delta":{"content":"partial"}}]}"#,
        r#"{"error":{"message":"overloaded","type":"server_error"}}"#,
    ])])
    .await;
    let mut agent = agent_for(base_url);
    let sink = Captured::default();

    let err = agent.run_turn("hello?", &sink).await.unwrap_err();
    match err {
        TurnError::Transport(ApiError::InvalidResponse(msg)) => {
            assert!(msg.contains("overloaded"), "got: {msg}")
        }
        other => panic!("expected invalid response, got {other}"),
    }
    assert!(agent.session().is_empty());
}

#[tokio::test]
async fn farewell_tool_ends_the_conversation() {
    let (base_url, _server) = serve(vec![
        Reply::Sse(vec![
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"c1","type":"function","function":{"name":"register_farewell","arguments":"{\"note\":\"user left\"}"}}]},"finish_reason":"tool_calls"}]}"#,
        ]),
        Reply::Sse(vec![
            r#"{"choices":[{"index":0,"delta":{"content":"Bye!"},"finish_reason":"stop"}]}"#,
        ]),
    ])
    .await;
    let mut agent = agent_for(base_url);

    let outcome = agent.run_turn("bye", &Captured::default()).await.expect("turn");
    match outcome {
        TurnOutcome::Farewell(farewell) => {
            assert_eq!(farewell.note.as_deref(), Some("user left"))
        }
        other => panic!("expected farewell, got {other:?}"),
    }
    assert_eq!(agent.session().len(), 4);
}

#[tokio::test]
async fn committed_session_exports_to_transcript() {
    let (base_url, _server) = serve(vec![Reply::Sse(vec![
        r#"{"choices":[{"index":0,"delta":{"content":"pong"},"finish_reason":"stop"}]}"#,
    ])])
    .await;
    let mut agent = agent_for(base_url);
    agent.run_turn("ping", &Captured::default()).await.expect("turn");

    let path = std::env::temp_dir().join(format!("chat-cli-transcript-{}.json", std::process::id()));
    transcript::export(&path, agent.session().snapshot()).expect("export");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert!(saved["saved_at"].is_string());
    assert_eq!(saved["messages"][0]["content"], "ping");
    assert_eq!(saved["messages"][1]["role"], "assistant");
    assert_eq!(saved["messages"][1]["content"], "pong");
}
