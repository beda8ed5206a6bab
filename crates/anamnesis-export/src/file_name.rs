use anamnesis_core::models::anamnesis::AnamnesisData;

const FALLBACK_STEM: &str = "paciente";
const MAX_COMPLAINT_CHARS: usize = 20;

/// File name for an exported anamnesis: `anamnese_<complaint>.<ext>`.
///
/// The complaint part is the first 20 characters of the chief complaint with
/// whitespace runs replaced by `_`. Path separators are replaced as well. An
/// empty complaint yields `paciente`.
pub fn export_file_name(data: &AnamnesisData, extension: &str) -> String {
    let head: String = data.chief_complaint.chars().take(MAX_COMPLAINT_CHARS).collect();

    let mut stem = String::with_capacity(head.len());
    let mut in_space = false;
    for c in head.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
        } else {
            stem.push(if matches!(c, '/' | '\\') { '_' } else { c });
            in_space = false;
        }
    }

    if stem.is_empty() {
        stem.push_str(FALLBACK_STEM);
    }
    format!("anamnese_{stem}.{}", extension.trim_start_matches('.'))
}
