//! Chat sessions: the response generator port and the per-script send cycle.

pub mod box_generator;
pub mod controller;
pub mod generator;
pub mod session;
