//! CLI entry point for chat-cli.

mod app;
mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Env var holding the `tracing` filter directive.
const LOG_ENV: &str = "CHAT_CLI_LOG";

#[tokio::main]
async fn main() {
    init_tracing();
    let args = cli::Args::parse();
    let code = app::entry::run(args).await;
    std::process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
