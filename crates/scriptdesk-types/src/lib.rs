//! Shared domain types for ScriptDesk.
//!
//! This crate contains the core domain types used across the workspace:
//! Script, ChatMessage, the persisted document shapes, configuration, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod script;
