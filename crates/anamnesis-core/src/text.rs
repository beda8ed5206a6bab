//! Text normalization shared by the checklist heuristic and the enum parsers.

/// Fold a lowercase Latin character to its unaccented base letter.
///
/// Returns `None` for bare combining marks (U+0300–U+036F) so that text that
/// arrives already decomposed loses its accents as well.
fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        '\u{0300}'..='\u{036f}' => return None,
        other => other,
    };
    Some(folded)
}

/// Lowercase `text` and strip diacritics.
pub fn fold_diacritics(text: &str) -> String {
    text.to_lowercase().chars().filter_map(fold_char).collect()
}

/// Lowercase, strip diacritics, and drop the punctuation `? . , ;`.
pub fn normalize(text: &str) -> String {
    fold_diacritics(text)
        .chars()
        .filter(|c| !matches!(c, '?' | '.' | ',' | ';'))
        .collect()
}

/// Return the first run of ASCII digits in `text`, or an empty string.
pub fn first_digit_run(text: &str) -> String {
    text.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect()
}
