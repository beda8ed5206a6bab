use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::Diagnosis;
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::timeline::TimelineEvent;
use anamnesis_core::reconcile::reconcile_diagnoses;
use anamnesis_export::docx::generate_docx;
use anamnesis_export::file_name::export_file_name;
use anamnesis_export::render::{render_anamnesis, render_case_report};
use anamnesis_export::styles::DocumentStyles;

fn sample() -> AnamnesisData {
    AnamnesisData {
        age: "58".to_string(),
        sex: "Masculino".to_string(),
        chief_complaint: "Dor no peito há 2 horas".to_string(),
        hpi: "Dor precordial em aperto".to_string(),
        blood_pressure: "150x90".to_string(),
        correct_diagnosis: Some("IAM".to_string()),
        hidden_lab_results: Some("Troponina elevada".to_string()),
        ..AnamnesisData::default()
    }
}

#[test]
fn anamnesis_sections_and_vital_sign_defaults() {
    let text = render_anamnesis(&sample()).unwrap();

    assert!(text.starts_with("# Idade:\n58"));
    assert!(text.contains("# Queixa Principal (QP): (Motivo principal da consulta, com tempo de evolução)\nDor no peito há 2 horas"));
    assert!(text.contains("PA: 150x90"));
    assert!(text.contains("FC: NI"));
    assert!(text.contains("SpO₂: NI"));
    assert!(text.ends_with("# Conduta Inicial (Médico):"));
}

#[test]
fn anamnesis_never_renders_answer_key() {
    let text = render_anamnesis(&sample()).unwrap();
    assert!(!text.contains("IAM"));
    assert!(!text.contains("Troponina elevada"));
}

#[test]
fn case_report_lists_diagnoses_and_timeline() {
    let diagnoses = reconcile_diagnoses(
        vec![Diagnosis::new("Síndrome coronariana aguda", 70, "Dor típica")],
        vec![Diagnosis::new("Dissecção de aorta", 5, "Grave")],
    );
    let timeline = vec![TimelineEvent {
        time: "Há 2 horas".to_string(),
        event: "Início da dor".to_string(),
    }];
    let case = SavedCase::new(sample(), &diagnoses, timeline);

    let report = render_case_report(&case, Some("Paciente de 58 anos com dor torácica.")).unwrap();
    assert!(report.starts_with(&format!("# {}", case.name)));
    assert!(report.contains("- **Síndrome coronariana aguda** (70%): Dor típica"));
    assert!(report.contains("- **Dissecção de aorta** (5%): Grave"));
    assert!(report.contains("- **Há 2 horas**: Início da dor"));
    assert!(report.contains("## Resumo para Prontuário\nPaciente de 58 anos com dor torácica."));
}

#[test]
fn case_report_without_results() {
    let case = SavedCase::new(sample(), &Default::default(), Vec::new());
    let report = render_case_report(&case, None).unwrap();

    assert!(report.contains("## Diagnósticos Prováveis\nNenhum."));
    assert!(!report.contains("## Linha do Tempo"));
    assert!(!report.contains("## Resumo para Prontuário"));
}

#[test]
fn docx_is_a_zip_package() {
    let text = render_anamnesis(&sample()).unwrap();
    let bytes = generate_docx(&format!("{text}\n---\n- **negrito** e texto"), &DocumentStyles::default()).unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn file_name_from_chief_complaint() {
    let mut data = AnamnesisData::default();
    assert_eq!(export_file_name(&data, "docx"), "anamnese_paciente.docx");

    data.chief_complaint = "Dor  no peito há 2 horas com sudorese".to_string();
    // First 20 characters: "Dor  no peito há 2 h"
    assert_eq!(export_file_name(&data, ".docx"), "anamnese_Dor_no_peito_há_2_h.docx");

    data.chief_complaint = "Febre/tosse".to_string();
    assert_eq!(export_file_name(&data, "txt"), "anamnese_Febre_tosse.txt");
}
