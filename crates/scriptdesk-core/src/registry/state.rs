//! In-memory registry state and the synchronous command interpreter.

use chrono::{DateTime, Duration, Utc};
use scriptdesk_types::chat::ChatHistories;
use scriptdesk_types::script::{Script, ScriptId, normalize_script_name};

use super::command::{CommandOutcome, Dirty, IgnoreReason, RegistryCommand};
use crate::retention::RetentionPolicy;

/// Scripts seeded into a workspace that has never stored a script list.
pub fn default_scripts(now: DateTime<Utc>) -> Vec<Script> {
    vec![
        Script {
            id: ScriptId::from("1"),
            name: "Customer Support".to_string(),
            last_accessed: now,
        },
        Script {
            id: ScriptId::from("2"),
            name: "Product Expert".to_string(),
            last_accessed: now - Duration::hours(1),
        },
    ]
}

#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub scripts: Vec<Script>,
    pub histories: ChatHistories,
    pub active: Option<ScriptId>,
}

impl RegistryState {
    pub fn new(scripts: Vec<Script>, histories: ChatHistories) -> Self {
        Self {
            scripts,
            histories,
            active: None,
        }
    }

    fn position(&self, id: &ScriptId) -> Option<usize> {
        self.scripts.iter().position(|s| &s.id == id)
    }

    pub fn contains(&self, id: &ScriptId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &ScriptId) -> Option<&Script> {
        self.scripts.iter().find(|s| &s.id == id)
    }

    fn fresh_id(&self) -> ScriptId {
        loop {
            let id = ScriptId::generate();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Drop histories that belong to no script. Returns how many were dropped.
    pub fn prune_orphans(&mut self) -> usize {
        let before = self.histories.len();
        let scripts = &self.scripts;
        self.histories
            .retain(|id, _| scripts.iter().any(|s| &s.id == id));
        before - self.histories.len()
    }

    /// Append a fresh script with an empty history and make it active.
    pub fn create(&mut self, now: DateTime<Utc>) -> Script {
        let script = Script::new(self.fresh_id(), now);
        self.histories.insert(script.id.clone(), Vec::new());
        self.active = Some(script.id.clone());
        self.scripts.push(script.clone());
        script
    }

    /// Apply one command, reporting the outcome and which documents changed.
    pub fn execute(
        &mut self,
        command: RegistryCommand,
        now: DateTime<Utc>,
        retention: &RetentionPolicy,
    ) -> (CommandOutcome, Dirty) {
        match command {
            RegistryCommand::Create => (CommandOutcome::Created(self.create(now)), Dirty::BOTH),

            RegistryCommand::Rename { id, name } => {
                let Some(name) = normalize_script_name(&name) else {
                    return ignored(IgnoreReason::EmptyName);
                };
                match self.scripts.iter_mut().find(|s| s.id == id) {
                    Some(script) => {
                        script.name = name;
                        (CommandOutcome::Applied, Dirty::SCRIPTS)
                    }
                    None => ignored(IgnoreReason::UnknownScript(id)),
                }
            }

            RegistryCommand::Delete { id } => match self.position(&id) {
                Some(index) => {
                    self.scripts.remove(index);
                    self.histories.remove(&id);
                    if self.active.as_ref() == Some(&id) {
                        self.active = None;
                    }
                    (CommandOutcome::Applied, Dirty::BOTH)
                }
                None => ignored(IgnoreReason::UnknownScript(id)),
            },

            RegistryCommand::Append { id, message } => {
                if !self.contains(&id) {
                    return ignored(IgnoreReason::UnknownScript(id));
                }
                self.histories.entry(id).or_default().push(message);
                (CommandOutcome::Applied, Dirty::HISTORIES)
            }

            RegistryCommand::Touch { id } => match self.scripts.iter_mut().find(|s| s.id == id) {
                Some(script) => {
                    script.last_accessed = now;
                    (CommandOutcome::Applied, Dirty::SCRIPTS)
                }
                None => ignored(IgnoreReason::UnknownScript(id)),
            },

            RegistryCommand::Activate { id } => {
                match self.scripts.iter_mut().find(|s| s.id == id) {
                    Some(script) => {
                        script.last_accessed = now;
                        self.active = Some(id);
                        (CommandOutcome::Applied, Dirty::SCRIPTS)
                    }
                    None => ignored(IgnoreReason::UnknownScript(id)),
                }
            }

            RegistryCommand::Sweep => {
                let purged = retention.apply_in_place(&mut self.histories, now);
                let dirty = if purged > 0 { Dirty::HISTORIES } else { Dirty::NONE };
                (CommandOutcome::Swept { purged }, dirty)
            }
        }
    }
}

fn ignored(reason: IgnoreReason) -> (CommandOutcome, Dirty) {
    (CommandOutcome::Ignored(reason), Dirty::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptdesk_types::chat::ChatMessage;
    use scriptdesk_types::script::DEFAULT_SCRIPT_NAME;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn run(state: &mut RegistryState, command: RegistryCommand) -> (CommandOutcome, Dirty) {
        state.execute(command, now(), &RetentionPolicy::default())
    }

    fn created(state: &mut RegistryState) -> Script {
        match run(state, RegistryCommand::Create).0 {
            CommandOutcome::Created(script) => script,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn test_create_appends_and_activates() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let script = created(&mut state);

        assert_eq!(state.scripts.len(), 3);
        assert_eq!(state.scripts.last().unwrap().id, script.id);
        assert_eq!(script.name, DEFAULT_SCRIPT_NAME);
        assert_eq!(script.last_accessed, now());
        assert_eq!(state.histories[&script.id], Vec::<ChatMessage>::new());
        assert_eq!(state.active, Some(script.id));
    }

    #[test]
    fn test_create_reports_both_documents_dirty() {
        let mut state = RegistryState::default();
        assert_eq!(run(&mut state, RegistryCommand::Create).1, Dirty::BOTH);
    }

    #[test]
    fn test_rename_keeps_order() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let (outcome, dirty) = run(
            &mut state,
            RegistryCommand::Rename {
                id: ScriptId::from("1"),
                name: "  Support Desk ".to_string(),
            },
        );
        assert_eq!(outcome, CommandOutcome::Applied);
        assert_eq!(dirty, Dirty::SCRIPTS);
        assert_eq!(state.scripts[0].name, "Support Desk");
        assert_eq!(state.scripts[1].id, ScriptId::from("2"));
    }

    #[test]
    fn test_rename_ignores_unknown_and_blank() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let (outcome, dirty) = run(
            &mut state,
            RegistryCommand::Rename {
                id: ScriptId::from("nope"),
                name: "x".to_string(),
            },
        );
        assert_eq!(
            outcome,
            CommandOutcome::Ignored(IgnoreReason::UnknownScript(ScriptId::from("nope")))
        );
        assert_eq!(dirty, Dirty::NONE);

        let (outcome, _) = run(
            &mut state,
            RegistryCommand::Rename {
                id: ScriptId::from("1"),
                name: "   ".to_string(),
            },
        );
        assert_eq!(outcome, CommandOutcome::Ignored(IgnoreReason::EmptyName));
        assert_eq!(state.scripts[0].name, "Customer Support");
    }

    #[test]
    fn test_delete_clears_active_and_history() {
        let mut state = RegistryState::default();
        let script = created(&mut state);
        run(
            &mut state,
            RegistryCommand::Append {
                id: script.id.clone(),
                message: ChatMessage::user("hi", now()),
            },
        );

        let (outcome, dirty) = run(&mut state, RegistryCommand::Delete { id: script.id.clone() });
        assert_eq!(outcome, CommandOutcome::Applied);
        assert_eq!(dirty, Dirty::BOTH);
        assert!(state.scripts.is_empty());
        assert!(!state.histories.contains_key(&script.id));
        assert!(state.active.is_none());
    }

    #[test]
    fn test_delete_keeps_other_active() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        run(&mut state, RegistryCommand::Activate { id: ScriptId::from("2") });
        run(&mut state, RegistryCommand::Delete { id: ScriptId::from("1") });
        assert_eq!(state.active, Some(ScriptId::from("2")));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let (outcome, dirty) = run(&mut state, RegistryCommand::Delete { id: ScriptId::from("9") });
        assert!(outcome.is_ignored());
        assert_eq!(dirty, Dirty::NONE);
        assert_eq!(state.scripts.len(), 2);
    }

    #[test]
    fn test_append_to_unknown_is_ignored() {
        let mut state = RegistryState::default();
        let (outcome, dirty) = run(
            &mut state,
            RegistryCommand::Append {
                id: ScriptId::from("ghost"),
                message: ChatMessage::user("boo", now()),
            },
        );
        assert!(outcome.is_ignored());
        assert_eq!(dirty, Dirty::NONE);
        assert!(state.histories.is_empty());
    }

    #[test]
    fn test_append_creates_missing_entry() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let (_, dirty) = run(
            &mut state,
            RegistryCommand::Append {
                id: ScriptId::from("2"),
                message: ChatMessage::user("hello", now()),
            },
        );
        assert_eq!(dirty, Dirty::HISTORIES);
        assert_eq!(state.histories[&ScriptId::from("2")].len(), 1);
    }

    #[test]
    fn test_touch_updates_last_accessed() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let later = now() + Duration::minutes(10);
        let (outcome, dirty) = state.execute(
            RegistryCommand::Touch { id: ScriptId::from("2") },
            later,
            &RetentionPolicy::default(),
        );
        assert_eq!(outcome, CommandOutcome::Applied);
        assert_eq!(dirty, Dirty::SCRIPTS);
        assert_eq!(state.get(&ScriptId::from("2")).unwrap().last_accessed, later);
        assert!(state.active.is_none());
    }

    #[test]
    fn test_sweep_only_dirty_when_something_purged() {
        let mut state = RegistryState::new(default_scripts(now()), ChatHistories::new());
        let (outcome, dirty) = run(&mut state, RegistryCommand::Sweep);
        assert_eq!(outcome, CommandOutcome::Swept { purged: 0 });
        assert_eq!(dirty, Dirty::NONE);

        state.histories.insert(
            ScriptId::from("1"),
            vec![ChatMessage::user("stale", now() - Duration::hours(48))],
        );
        let (outcome, dirty) = run(&mut state, RegistryCommand::Sweep);
        assert_eq!(outcome, CommandOutcome::Swept { purged: 1 });
        assert_eq!(dirty, Dirty::HISTORIES);
        assert!(state.histories[&ScriptId::from("1")].is_empty());
    }

    #[test]
    fn test_prune_orphans() {
        let mut histories = ChatHistories::new();
        histories.insert(ScriptId::from("1"), Vec::new());
        histories.insert(ScriptId::from("orphan"), Vec::new());
        let mut state = RegistryState::new(default_scripts(now()), histories);

        assert_eq!(state.prune_orphans(), 1);
        assert!(state.histories.contains_key(&ScriptId::from("1")));
        assert!(!state.histories.contains_key(&ScriptId::from("orphan")));
    }
}
