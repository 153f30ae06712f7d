//! Process lifecycle: config, banner, chat loop, transcript.

use std::io::{self, IsTerminal};
use std::path::Path;

use chat_cli::agent::transport::ToolLoopTransport;
use chat_cli::agent::{Agent, FarewellSignal};
use chat_cli::api::ApiClient;
use chat_cli::config::{load_config, Config, LoadedConfig};
use chat_cli::repl::{self, run_chat_loop, EXIT_COMMANDS};
use chat_cli::tools::ToolRegistry;
use chat_cli::transcript::{self, TRANSCRIPT_FILE};
use chat_cli::ui::input::StdinReader;
use chat_cli::ui::render::{RenderSink, Renderer};

use crate::cli::Args;

/// Run the interactive client and return the process exit code.
pub(crate) async fn run(args: Args) -> i32 {
    let loaded = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return 1;
        }
    };

    let color = !args.no_color && io::stdout().is_terminal();
    let renderer = Renderer::new(color);
    for line in banner_lines(&loaded) {
        renderer.info(&line);
    }
    renderer.notice(&exit_hint());

    let mut agent = build_agent(&loaded.config, args.no_history);
    let mut input = StdinReader::new();
    let code = match run_chat_loop(&mut agent, &mut input, &renderer, repl::ctrl_c).await {
        Ok(reason) => {
            tracing::debug!(?reason, "chat loop finished");
            0
        }
        Err(e) => {
            renderer.error(&format!("[error] failed to read input: {e}"));
            1
        }
    };

    renderer.notice("Goodbye!");
    transcript::export_best_effort(Path::new(TRANSCRIPT_FILE), agent.session().snapshot());
    code
}

/// Wire the HTTP client, built-in tools and orchestrator from config.
fn build_agent(config: &Config, no_history: bool) -> Agent {
    let farewell = FarewellSignal::new();
    let client = ApiClient::new(&config.api, config.request_timeout());
    let tools = ToolRegistry::with_builtins(farewell.clone());
    let transport = ToolLoopTransport::new(
        Box::new(client),
        tools,
        config.api.model.clone(),
        config.api.temperature,
    )
    .with_system_prompt(config.system_prompt.clone())
    .with_max_tool_rounds(config.max_tool_rounds);
    Agent::new(Box::new(transport), farewell).with_no_history(no_history)
}

fn banner_lines(loaded: &LoadedConfig) -> [String; 2] {
    [
        format!(
            "Using API URL: {} | Model: {}",
            loaded.config.api_url, loaded.config.api.model
        ),
        format!("Config file: {}", loaded.path.display()),
    ]
}

fn exit_hint() -> String {
    match EXIT_COMMANDS.split_last() {
        Some((last, rest)) => format!("Type {}, or {last} to leave the chat.", rest.join(", ")),
        None => String::new(),
    }
}
