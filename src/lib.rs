//! Simulated processor library.
//!
//! Provides the program loader, the execution engine and the configuration
//! used by the `vmsim` binary.

pub mod config;
pub mod utils;
pub mod virtual_machine;
