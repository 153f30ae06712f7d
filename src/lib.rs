//! chat-cli: an interactive chat client for OpenAI-compatible APIs.
//!
//! The crate streams assistant replies, lets the model call local tools and
//! keeps the conversation history consistent when a turn fails midway.
//!
//! # Quick start
//!
//! ```no_run
//! use chat_cli::agent::transport::ToolLoopTransport;
//! use chat_cli::agent::{Agent, FarewellSignal};
//! use chat_cli::api::ApiClient;
//! use chat_cli::config::load_config;
//! use chat_cli::tools::ToolRegistry;
//! use chat_cli::ui::render::Renderer;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap().config;
//! let farewell = FarewellSignal::new();
//! let transport = ToolLoopTransport::new(
//!     Box::new(ApiClient::new(&config.api, config.request_timeout())),
//!     ToolRegistry::with_builtins(farewell.clone()),
//!     config.api.model.clone(),
//!     config.api.temperature,
//! );
//! let mut agent = Agent::new(Box::new(transport), farewell);
//! agent.run_turn("Hello!", &Renderer::new(false)).await.unwrap();
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod message;
pub mod repl;
pub mod session;
#[cfg(test)]
pub mod testsupport;
pub mod tools;
pub mod transcript;
pub mod types;
pub mod ui;
