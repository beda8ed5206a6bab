//! Keyword heuristic that flags checklist items already answered by the
//! free-text anamnesis.
//!
//! This is a display hint only. False positives and false negatives are
//! expected.

use serde::{Deserialize, Serialize};

use crate::reconcile::MergedChecklistItem;
use crate::text::normalize;

/// Words ignored when extracting keywords (compared after normalization).
const STOP_WORDS: &[&str] = &[
    "a", "o", "e", "ou", "de", "do", "da", "em", "um", "uma", "com", "por", "para", "sem", "tem",
    "houve", "qual", "quando", "como", "onde", "se", "esta", "este", "seu", "sua", "ha", "sobre",
    "paciente", "refere",
];

/// Keywords that may appear in lay or abbreviated form in the anamnesis.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("toracica", &["toracica", "peito", "precordial", "precordio"]),
    ("cefaleia", &["cefaleia", "cabeca"]),
    ("dispneia", &["dispneia", "ar", "respirar", "respiracao", "folego"]),
    ("membros", &["membros", "pernas", "bracos"]),
    ("inferiores", &["inferiores", "pernas", "mmssii", "mmii"]),
    ("superiores", &["superiores", "bracos", "mmss"]),
    ("febre", &["febre", "febril", "temperatura"]),
    ("sudorese", &["sudorese", "suor", "diaforese"]),
];

/// How an item's keywords fared against the anamnesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keywords: Vec<String>,
    pub matched: Vec<String>,
    pub required: usize,
}

impl KeywordMatch {
    pub fn is_present(&self) -> bool {
        !self.keywords.is_empty() && self.matched.len() >= self.required
    }
}

/// Extract the significant keywords of a checklist item.
pub fn keywords(item: &str) -> Vec<String> {
    normalize(item)
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

fn synonyms_for(keyword: &str) -> Option<&'static [&'static str]> {
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == keyword)
        .map(|(_, synonyms)| *synonyms)
}

/// Number of keyword hits needed: every keyword for two or fewer, otherwise
/// 75% rounded up.
pub fn required_matches(keyword_count: usize) -> usize {
    if keyword_count <= 2 {
        keyword_count
    } else {
        (keyword_count * 3).div_ceil(4)
    }
}

/// Match an item's keywords (and their synonyms) against the anamnesis text.
pub fn match_item(item: &str, anamnesis_text: &str) -> KeywordMatch {
    let haystack = normalize(anamnesis_text);
    let keywords = keywords(item);

    let matched = keywords
        .iter()
        .filter(|keyword| match synonyms_for(keyword) {
            Some(synonyms) => synonyms.iter().any(|s| haystack.contains(s)),
            None => haystack.contains(keyword.as_str()),
        })
        .cloned()
        .collect();

    KeywordMatch {
        required: required_matches(keywords.len()),
        keywords,
        matched,
    }
}

/// Whether `item` appears to be already covered by `anamnesis_text`.
pub fn is_item_present(item: &str, anamnesis_text: &str) -> bool {
    match_item(item, anamnesis_text).is_present()
}

/// A merged checklist item annotated with the presence hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedChecklistItem {
    #[serde(flatten)]
    pub entry: MergedChecklistItem,
    pub present: bool,
}

/// Annotate every merged checklist item with [`is_item_present`].
pub fn annotate(checklist: &[MergedChecklistItem], anamnesis_text: &str) -> Vec<AnnotatedChecklistItem> {
    checklist
        .iter()
        .map(|entry| AnnotatedChecklistItem {
            present: is_item_present(&entry.item.item, anamnesis_text),
            entry: entry.clone(),
        })
        .collect()
}
