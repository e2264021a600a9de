//! Storage abstractions for ScriptDesk.
//!
//! Defines the document store port, the soft-failing adapter the registry
//! persists through, and an in-memory store. Durable implementations live in
//! scriptdesk-infra.

pub mod document_store;
pub mod memory;
pub mod persistent;
