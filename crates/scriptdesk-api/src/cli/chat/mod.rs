//! Interactive chat loop.

pub mod commands;
pub mod input;
pub mod loop_runner;
