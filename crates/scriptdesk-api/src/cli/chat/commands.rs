//! Slash command parsing for the chat loop.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Leave the chat. Replies still in flight are saved when they arrive.
    Quit,
    /// Create a script and switch to it.
    New,
    /// Make another script active.
    Switch(String),
    /// Print the active script's history.
    History,
    /// List scripts.
    List,
    /// Rename the active script.
    Rename(String),
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/quit" | "/exit" | "/q" => ChatCommand::Quit,
        "/new" => ChatCommand::New,
        "/history" => ChatCommand::History,
        "/list" | "/ls" => ChatCommand::List,
        "/switch" | "/s" if !arg.is_empty() => ChatCommand::Switch(arg.to_string()),
        "/switch" | "/s" => ChatCommand::Unknown("/switch requires a script id".to_string()),
        "/rename" if !arg.is_empty() => ChatCommand::Rename(arg.to_string()),
        "/rename" => ChatCommand::Unknown("/rename requires a name".to_string()),
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Help text listing all available commands.
pub fn help_text() -> String {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Create a script and switch to it"),
        ("/switch <id>", "Switch to another script"),
        ("/rename <name>", "Rename the current script"),
        ("/list", "List scripts"),
        ("/history", "Show the current script's messages"),
        ("/quit", "Leave the chat"),
    ];

    let mut text = format!("\n  {}\n\n", style("Available commands:").bold());
    for (cmd, desc) in rows {
        text.push_str(&format!("  {:<16} {desc}\n", style(cmd).cyan()));
    }
    text
}
