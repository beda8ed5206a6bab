//! anamnesis-gemini
//!
//! Gemini model invocation, rate-limit retry, and structured output parsing.

pub mod assistant;
pub mod client;
pub mod error;
pub mod prompts;
pub mod retry;
pub mod schema;
