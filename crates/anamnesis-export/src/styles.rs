use serde::{Deserialize, Serialize};

/// Fonts, sizes and margins for DOCX exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStyles {
    pub body_font: String,
    pub heading_font: String,
    /// Points.
    pub body_size: usize,
    pub heading1_size: usize,
    pub heading2_size: usize,
    pub heading3_size: usize,
    /// Uniform page margin in inches.
    pub margin_inches: f64,
}

impl Default for DocumentStyles {
    fn default() -> Self {
        Self {
            body_font: "Helvetica".to_string(),
            heading_font: "Helvetica".to_string(),
            body_size: 11,
            heading1_size: 14,
            heading2_size: 13,
            heading3_size: 12,
            margin_inches: 0.6,
        }
    }
}
