//! Wire format and helpers of the domain types.

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::{Diagnosis, DiagnosisDetail, DiagnosisResponse};
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::training::{
    Difficulty, EntryKind, EvaluationResult, InvestigationLog, Specialty, StudentHypotheses,
};
use anamnesis_core::reconcile::reconcile_diagnoses;
use serde_json::json;

#[test]
fn diagnosis_response_uses_portuguese_keys() {
    let raw = json!({
        "diagnosticosProvaveis": [
            { "diagnostico": "Pneumonia", "probabilidade": 70, "justificativa": "febre e tosse" }
        ],
        "diagnosticosDiferenciais": [
            { "diagnostico": "TEP", "probabilidade": 5, "justificativa": "dispneia" }
        ]
    });

    let response: DiagnosisResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(response.probable[0].name, "Pneumonia");
    assert_eq!(response.probable[0].probability, 70);
    assert_eq!(response.differential[0].rationale, "dispneia");
}

#[test]
fn missing_lists_default_to_empty() {
    let response: DiagnosisResponse = serde_json::from_value(json!({})).unwrap();
    assert!(response.probable.is_empty());
    assert!(response.differential.is_empty());
}

#[test]
fn probability_is_clamped_and_rounded() {
    let d: Diagnosis =
        serde_json::from_value(json!({ "diagnostico": "X", "probabilidade": 130 })).unwrap();
    assert_eq!(d.probability, 100);
    let d: Diagnosis =
        serde_json::from_value(json!({ "diagnostico": "X", "probabilidade": -4 })).unwrap();
    assert_eq!(d.probability, 0);
    let d: Diagnosis =
        serde_json::from_value(json!({ "diagnostico": "X", "probabilidade": 12.6 })).unwrap();
    assert_eq!(d.probability, 13);
}

#[test]
fn detail_tolerates_missing_plan_categories() {
    let detail: DiagnosisDetail = serde_json::from_value(json!({
        "checklistAnamnese": [{ "item": "Febre?", "justificativa": "infecção" }],
        "planoConduta": { "examesConfirmacao": ["Hemograma"] }
    }))
    .unwrap();
    assert_eq!(detail.plan.confirmation_tests, vec!["Hemograma"]);
    assert!(detail.plan.suggested_medications.is_empty());
}

#[test]
fn anamnesis_round_trips_and_hides_empty_training_fields() {
    let data = AnamnesisData {
        age: "45".into(),
        chief_complaint: "Dor torácica".into(),
        hpi: "Há 2 horas".into(),
        ..Default::default()
    };

    let value = serde_json::to_value(&data).unwrap();
    assert_eq!(value["idade"], "45");
    assert_eq!(value["queixaPrincipal"], "Dor torácica");
    assert!(value.get("diagnosticoCorreto").is_none());

    let back: AnamnesisData = serde_json::from_value(value).unwrap();
    assert_eq!(back, data);
}

#[test]
fn clean_keeps_first_digit_run_of_age() {
    let data = AnamnesisData { age: "aprox. 45 anos (nasc. 1979)".into(), ..Default::default() };
    assert_eq!(data.clean().age, "45");

    let data = AnamnesisData { age: "idoso".into(), ..Default::default() };
    assert_eq!(data.clean().age, "");
}

#[test]
fn analysis_requires_twenty_characters_of_complaint() {
    let short = AnamnesisData { chief_complaint: "Dor".into(), hpi: "há 2h".into(), ..Default::default() };
    assert!(!short.is_ready_for_analysis());

    let long = AnamnesisData {
        chief_complaint: "Dor torácica".into(),
        hpi: "iniciada há 2 horas".into(),
        ..Default::default()
    };
    assert!(long.is_ready_for_analysis());
}

#[test]
fn free_text_excludes_answer_key() {
    let data = AnamnesisData {
        chief_complaint: "Febre".into(),
        correct_diagnosis: Some("Endocardite".into()),
        hidden_lab_results: Some("Hemocultura positiva".into()),
        ..Default::default()
    };
    assert!(data.is_training_case());
    assert!(!data.free_text().contains("Endocardite"));
    assert!(!data.without_answer_key().is_training_case());
}

#[test]
fn investigation_log_is_append_only_and_serializes_as_array() {
    let mut log = InvestigationLog::new();
    log.push(EntryKind::System, "Novo caso gerado.");
    log.push(EntryKind::Request, "ausculta pulmonar");
    log.push(EntryKind::Response, "MV presente, crepitantes em base direita");

    assert_eq!(log.len(), 3);
    assert_eq!(log.entries()[1].kind, EntryKind::Request);

    let value = serde_json::to_value(&log).unwrap();
    assert_eq!(value[1]["type"], "request");
    assert!(value[1]["timestamp"].is_string());

    let text = log.to_prompt_text();
    assert!(text.contains("Estudante solicitou: ausculta pulmonar"));
    assert!(text.contains("Simulador respondeu: MV presente"));
}

#[test]
fn specialty_and_difficulty_parse_folded_names() {
    assert_eq!("emergencia".parse::<Specialty>().unwrap(), Specialty::Emergency);
    assert_eq!("Emergência".parse::<Specialty>().unwrap(), Specialty::Emergency);
    assert_eq!("gineco-obstetricia".parse::<Specialty>().unwrap(), Specialty::ObstetricsGynecology);
    assert!("dermatologia".parse::<Specialty>().is_err());

    assert_eq!("dificil".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    assert_eq!("FÁCIL".parse::<Difficulty>().unwrap(), Difficulty::Easy);
    assert_eq!(Difficulty::default(), Difficulty::Intermediate);

    assert_eq!(serde_json::to_value(Specialty::Emergency).unwrap(), "Emergência");
}

#[test]
fn evaluation_score_is_clamped() {
    let eval: EvaluationResult = serde_json::from_value(json!({
        "score": 120,
        "scoreJustificativa": "..."
    }))
    .unwrap();
    assert_eq!(eval.score, 100);
}

#[test]
fn hypotheses_compare_case_insensitively() {
    let h = StudentHypotheses { principal: " infarto agudo do miocárdio ".into(), differentials: vec![] };
    assert!(h.principal_matches("Infarto Agudo do Miocárdio"));
    assert!(!h.principal_matches(""));
}

#[test]
fn saved_case_uses_camel_case_keys() {
    let reconciled = reconcile_diagnoses(
        vec![Diagnosis::new("Pneumonia", 60, "")],
        vec![Diagnosis::new("TEP", 4, "")],
    );
    let case = SavedCase::new(AnamnesisData::default(), &reconciled, vec![]);
    assert!(case.name.starts_with("Paciente - "));

    let value = serde_json::to_value(&case).unwrap();
    assert!(value.get("savedAt").is_some());
    assert!(value.get("anamnesisData").is_some());
    assert_eq!(value["differentialDiagnoses"][0]["diagnostico"], "TEP");
    assert_eq!(case.reconciled(), reconciled);
}
