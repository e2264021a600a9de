//! Business logic and port definitions for ScriptDesk.
//!
//! This crate owns the script registry, the retention policy, the recency
//! view, and the chat session controller. It defines the "ports"
//! (`DocumentStore`, `ResponseGenerator`, `Clock`) that the infrastructure
//! layer implements, and depends only on `scriptdesk-types` -- never on
//! `scriptdesk-infra` or any database/IO crate.

pub mod chat;
pub mod clock;
pub mod recency;
pub mod registry;
pub mod retention;
pub mod storage;
pub mod sweeper;
