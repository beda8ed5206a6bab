//! Plain-text rendering of command results for the terminal.

use std::fmt::Write;

use anamnesis_core::checklist::AnnotatedChecklistItem;
use anamnesis_core::models::academic::AcademicSearchResult;
use anamnesis_core::models::diagnosis::{Diagnosis, ManagementPlan};
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::timeline::TimelineEvent;
use anamnesis_core::models::training::{EntryKind, EvaluationResult, InvestigationLogEntry};
use anamnesis_core::reconcile::ReconciledDiagnoses;

use crate::state::DetailPanel;

fn diagnosis_lines(out: &mut String, title: &str, list: &[Diagnosis]) {
    let _ = writeln!(out, "{title}");
    if list.is_empty() {
        let _ = writeln!(out, "  (nenhum)");
    }
    for d in list {
        let _ = writeln!(out, "  {:>3}%  {}", d.probability, d.name);
        if !d.rationale.is_empty() {
            let _ = writeln!(out, "        {}", d.rationale);
        }
    }
}

pub fn diagnoses(result: &ReconciledDiagnoses) -> String {
    let mut out = String::new();
    diagnosis_lines(&mut out, "Diagnósticos prováveis:", &result.probable);
    out.push('\n');
    diagnosis_lines(&mut out, "Diagnósticos diferenciais:", &result.differential);
    out
}

pub fn timeline(events: &[TimelineEvent]) -> String {
    if events.is_empty() {
        return "Linha do tempo: nenhum evento identificado.\n".to_string();
    }
    let mut out = String::from("Linha do tempo:\n");
    for e in events {
        let _ = writeln!(out, "  {}: {}", e.time, e.event);
    }
    out
}

fn plan_lines(out: &mut String, plan: &ManagementPlan) {
    for (title, items) in [
        ("Exames de confirmação", &plan.confirmation_tests),
        ("Medicações sugeridas", &plan.suggested_medications),
        ("Encaminhamentos", &plan.referrals),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}:");
        for item in items {
            let _ = writeln!(out, "  - {item}");
        }
    }
}

/// The detail panel with presence hints on each checklist item.
pub fn details(panel: &DetailPanel, checklist: &[AnnotatedChecklistItem]) -> String {
    let mut out = String::new();
    let names: Vec<&str> = panel.slots.iter().map(|(d, _)| d.name.as_str()).collect();
    let _ = writeln!(out, "Investigação: {}", names.join(", "));

    let _ = writeln!(out, "\nChecklist de anamnese:");
    if checklist.is_empty() {
        let _ = writeln!(out, "  (vazio)");
    }
    for entry in checklist {
        let mark = if entry.present { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {}", entry.entry.item.item);
        if !entry.entry.item.rationale.is_empty() {
            let _ = writeln!(out, "      {}", entry.entry.item.rationale);
        }
        if names.len() > 1 {
            let _ = writeln!(out, "      ({})", entry.entry.sources.join(", "));
        }
    }

    let merged = panel.merged();
    if !merged.plan.is_empty() {
        out.push('\n');
        plan_lines(&mut out, &merged.plan);
    }

    let failures = panel.failures();
    if !failures.is_empty() {
        out.push('\n');
        for (name, error) in failures {
            let _ = writeln!(out, "Falha ao detalhar {name}: {error}");
        }
    }
    out
}

pub fn log_entry(entry: &InvestigationLogEntry) -> String {
    let who = match entry.kind {
        EntryKind::Request => "Você",
        EntryKind::Response => "Simulador",
        EntryKind::System => "Sistema",
    };
    format!("[{who}] {}", entry.content)
}

pub fn evaluation(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Nota: {}/100", result.score);
    for (title, body) in [
        ("Justificativa", &result.score_rationale),
        ("Pontos fortes", &result.strengths),
        ("Pontos a melhorar", &result.improvements),
        ("Raciocínio esperado", &result.correct_reasoning),
        ("Análise da conduta", &result.conduct_analysis),
    ] {
        if !body.trim().is_empty() {
            let _ = writeln!(out, "\n{title}:\n{}", body.trim());
        }
    }
    out
}

pub fn academic(result: &AcademicSearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Resumo:\n{}\n", result.disease_summary);
    let _ = writeln!(out, "Diretrizes de tratamento:\n{}\n", result.treatment_guidelines);
    let _ = writeln!(out, "Achados recentes:\n{}", result.recent_findings);
    if !result.sources.is_empty() {
        let _ = writeln!(out, "\nFontes:");
        for source in &result.sources {
            let _ = writeln!(out, "  - {} <{}>", source.web.title, source.web.uri);
        }
    }
    out
}

pub fn case_list(cases: &[SavedCase]) -> String {
    if cases.is_empty() {
        return "Nenhum caso salvo.\n".to_string();
    }
    let mut out = String::new();
    for case in cases {
        let complaint: String = case.anamnesis_data.chief_complaint.chars().take(60).collect();
        let _ = writeln!(out, "{}  {}\n    {}", case.id, case.name, complaint);
    }
    out
}
