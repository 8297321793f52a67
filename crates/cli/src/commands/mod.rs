//! Subcommand implementations

pub mod amount;
pub mod block_log;
pub mod chain;
pub mod compare;
pub mod ports;
