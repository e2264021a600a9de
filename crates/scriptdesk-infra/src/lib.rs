//! Infrastructure layer for ScriptDesk.
//!
//! Contains implementations of the ports defined in `scriptdesk-core`:
//! SQLite and JSON-file document stores, the Gemini and echo response
//! generators, plus config loading and data directory resolution.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
