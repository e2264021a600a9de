//! CLI command definitions for the `scriptdesk` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod script;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Keep several independent chat scripts with an AI assistant.
#[derive(Parser)]
#[command(name = "scriptdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep everything in memory for this run; nothing is read or saved.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new script.
    New,

    /// Rename a script.
    Rename {
        /// Script id.
        id: String,

        /// New name (trimmed, at most 40 characters).
        name: String,
    },

    /// Delete a script and its chat history.
    #[command(alias = "rm")]
    Delete {
        /// Script id.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// List scripts.
    #[command(alias = "ls")]
    List {
        /// Only scripts used in the last day, most recent first.
        #[arg(long)]
        recent: bool,
    },

    /// Show a script's chat history.
    Show {
        /// Script id.
        id: String,
    },

    /// Start an interactive chat.
    Chat {
        /// Script to start with (defaults to the most recently used one).
        id: Option<String>,
    },

    /// Purge expired messages now.
    Sweep,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Commands {
    /// Whether the command runs the long-lived chat session.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Commands::Chat { .. })
    }
}
