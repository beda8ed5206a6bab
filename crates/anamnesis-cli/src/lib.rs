//! anamnesis-cli library root.
//!
//! The state store, session workflows, configuration and import validation
//! live here so integration tests can drive them without the binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod import;
pub mod output;
pub mod session;
pub mod state;
