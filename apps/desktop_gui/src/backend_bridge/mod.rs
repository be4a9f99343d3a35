//! Backend worker bridge: command definitions and the runtime that executes them.

pub mod commands;
pub mod runtime;
