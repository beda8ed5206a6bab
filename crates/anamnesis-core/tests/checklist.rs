//! Checklist presence heuristic.

use anamnesis_core::checklist::{annotate, is_item_present, keywords, match_item, required_matches};
use anamnesis_core::models::diagnosis::ChecklistItem;
use anamnesis_core::reconcile::MergedChecklistItem;

#[test]
fn synonym_maps_toracica_to_peito() {
    let m = match_item("Dor torácica irradiando", "paciente refere dor no peito");
    assert_eq!(m.keywords, vec!["dor", "toracica", "irradiando"]);
    assert!(m.matched.contains(&"toracica".to_string()));
    assert!(m.matched.contains(&"dor".to_string()));
    // Three keywords need three hits; "irradiando" is not mentioned.
    assert_eq!(m.required, 3);
    assert!(!m.is_present());
}

#[test]
fn two_keyword_item_matches_through_synonym() {
    assert!(is_item_present("Dor torácica?", "Paciente refere dor no peito há 2 horas."));
}

#[test]
fn stop_words_and_short_words_are_ignored() {
    assert_eq!(keywords("Paciente refere febre há dias?"), vec!["febre", "dias"]);
    assert_eq!(keywords("A dor é em um lado"), vec!["dor", "lado"]);
}

#[test]
fn accents_and_punctuation_are_normalized() {
    assert!(is_item_present("Cefaléia; náusea.", "Refere CEFALEIA intensa e nausea"));
}

#[test]
fn three_quarters_rounded_up_for_longer_items() {
    assert_eq!(required_matches(0), 0);
    assert_eq!(required_matches(1), 1);
    assert_eq!(required_matches(2), 2);
    assert_eq!(required_matches(3), 3);
    assert_eq!(required_matches(4), 3);
    assert_eq!(required_matches(5), 4);
    assert_eq!(required_matches(8), 6);

    // 4 keywords, 3 found: present.
    assert!(is_item_present(
        "Febre alta persistente noturna",
        "febre alta persistente desde ontem",
    ));
}

#[test]
fn item_without_keywords_is_never_present() {
    assert!(!is_item_present("E a?", "qualquer texto"));
}

#[test]
fn absent_finding_is_not_present() {
    assert!(!is_item_present("Edema de membros inferiores?", "dor abdominal difusa"));
}

#[test]
fn lay_terms_for_limbs_match() {
    assert!(is_item_present("Edema membros inferiores", "edema em ambas as pernas"));
}

#[test]
fn annotate_marks_each_item() {
    let merged = vec![
        MergedChecklistItem {
            item: ChecklistItem { item: "Febre?".into(), rationale: String::new() },
            sources: vec!["Pneumonia".into()],
        },
        MergedChecklistItem {
            item: ChecklistItem { item: "Hemoptise?".into(), rationale: String::new() },
            sources: vec!["Tuberculose".into()],
        },
    ];

    let annotated = annotate(&merged, "Paciente febril há 3 dias");
    assert!(annotated[0].present);
    assert!(!annotated[1].present);
}
