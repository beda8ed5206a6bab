//! anamnesis-storage
//!
//! Local persistence: JSON state files under a data directory, the saved
//! API key, and the case history.

pub mod api_key;
pub mod cases;
pub mod error;
pub mod objects;
pub mod state;
pub mod store;
