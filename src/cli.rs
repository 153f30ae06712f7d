//! CLI argument parsing via clap.

use clap::Parser;
use std::path::PathBuf;

/// Chat with an OpenAI-compatible API.
#[derive(Debug, Parser)]
#[command(name = "chat-cli", version)]
pub struct Args {
    /// Path to config file (default: ~/.config/chat-cli/config.toml).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not reuse earlier conversation in subsequent prompts.
    #[arg(long = "no-history")]
    pub no_history: bool,

    /// Disable ANSI colors even when stdout is a TTY.
    #[arg(long = "no-color")]
    pub no_color: bool,
}
