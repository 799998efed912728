//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::handle::HandleArgs;

/// Multiplexer-aware desktop notifications for terminal chat clients.
///
/// Decides for each chat message whether you are away from the conversation
/// (window unfocused, tmux pane inactive, or another buffer displayed) and
/// sends a desktop notification if so.
#[derive(Debug, Parser)]
#[command(name = "muxnotify", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill missing options with their defaults and list them.
    Init,

    /// Inspect or change plugin options.
    #[command(subcommand)]
    Config(ConfigAction),

    /// Decide on a single message and notify if the user is away.
    Handle(HandleArgs),

    /// Read JSONL event records from stdin and notify as they arrive.
    Watch {
        /// Compare the active tmux pane against this pid (default: parent process).
        #[arg(long)]
        host_pid: Option<u32>,
    },

    /// Show what the environment probes currently report.
    Probe {
        /// Compare the active tmux pane against this pid (default: parent process).
        #[arg(long)]
        host_pid: Option<u32>,
    },
}

/// Option subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// List every option with its value and default.
    List,
    /// Print one option's value.
    Get {
        /// Option name.
        name: String,
    },
    /// Change one option.
    Set {
        /// Option name.
        name: String,
        /// New value.
        value: String,
    },
}
