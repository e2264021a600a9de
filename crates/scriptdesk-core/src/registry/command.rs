//! Registry commands and their outcomes.
//!
//! Every change to scripts or histories is expressed as a [`RegistryCommand`]
//! and applied through `ScriptRegistry::apply`.

use scriptdesk_types::chat::ChatMessage;
use scriptdesk_types::script::{Script, ScriptId};

/// A single state change.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCommand {
    /// Create a script with a fresh id and make it active.
    Create,
    Rename { id: ScriptId, name: String },
    /// Remove a script and its history.
    Delete { id: ScriptId },
    /// Append a message to a script's history.
    Append { id: ScriptId, message: ChatMessage },
    /// Mark a script as accessed now.
    Touch { id: ScriptId },
    /// Make a script the active one (also touches it).
    Activate { id: ScriptId },
    /// Run the retention policy over all histories.
    Sweep,
}

impl RegistryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryCommand::Create => "create",
            RegistryCommand::Rename { .. } => "rename",
            RegistryCommand::Delete { .. } => "delete",
            RegistryCommand::Append { .. } => "append",
            RegistryCommand::Touch { .. } => "touch",
            RegistryCommand::Activate { .. } => "activate",
            RegistryCommand::Sweep => "sweep",
        }
    }
}

/// What applying a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Created(Script),
    Applied,
    Swept { purged: usize },
    /// Nothing changed and nothing was saved.
    Ignored(IgnoreReason),
}

impl CommandOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, CommandOutcome::Ignored(_))
    }
}

/// Why a command was a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownScript(ScriptId),
    EmptyName,
}

/// Which documents a command changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Dirty {
    pub scripts: bool,
    pub histories: bool,
}

impl Dirty {
    pub const NONE: Dirty = Dirty {
        scripts: false,
        histories: false,
    };
    pub const SCRIPTS: Dirty = Dirty {
        scripts: true,
        histories: false,
    };
    pub const HISTORIES: Dirty = Dirty {
        scripts: false,
        histories: true,
    };
    pub const BOTH: Dirty = Dirty {
        scripts: true,
        histories: true,
    };
}
