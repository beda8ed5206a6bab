//! anamnesis-export
//!
//! Sectioned text rendering of an anamnesis and case report (Tera), DOCX
//! generation, and export file naming.

pub mod docx;
pub mod error;
pub mod file_name;
pub mod render;
pub mod styles;
