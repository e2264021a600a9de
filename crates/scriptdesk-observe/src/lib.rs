//! Observability setup for ScriptDesk: structured logging and optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
