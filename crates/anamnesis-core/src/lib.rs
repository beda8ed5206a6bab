//! anamnesis-core
//!
//! Pure domain types, diagnosis reconciliation, and the checklist presence
//! heuristic. No network or filesystem access; this is the shared vocabulary
//! of the Anamnesis workspace.

pub mod checklist;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod text;
