use serde::{Deserialize, Serialize};

use crate::text::first_digit_run;

/// Minimum length of chief complaint plus HPI before an analysis is allowed.
pub const MIN_COMPLAINT_LEN: usize = 20;

/// A structured patient history.
///
/// Field names on the wire follow the Portuguese keys used by the response
/// schemas, so the same type round-trips through the model and saved cases.
/// Keys missing from a payload deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnamnesisData {
    #[serde(rename = "idade")]
    pub age: String,
    #[serde(rename = "sexo")]
    pub sex: String,
    #[serde(rename = "comorbidades")]
    pub comorbidities: String,
    #[serde(rename = "medicamentosEmUso")]
    pub current_medications: String,
    #[serde(rename = "alergias")]
    pub allergies: String,
    #[serde(rename = "historiaPregressa")]
    pub past_history: String,
    #[serde(rename = "queixaPrincipal")]
    pub chief_complaint: String,
    /// History of present illness.
    #[serde(rename = "hda")]
    pub hpi: String,
    #[serde(rename = "pa")]
    pub blood_pressure: String,
    #[serde(rename = "fc")]
    pub heart_rate: String,
    #[serde(rename = "fr")]
    pub respiratory_rate: String,
    #[serde(rename = "temp")]
    pub temperature: String,
    #[serde(rename = "spo2")]
    pub spo2: String,
    #[serde(rename = "pesoAltura")]
    pub weight_height: String,
    #[serde(rename = "exameFisicoSumario")]
    pub physical_exam: String,
    #[serde(rename = "resultadosExames")]
    pub exam_results: String,
    #[serde(rename = "hipotesesDiagnosticas")]
    pub diagnostic_hypotheses: String,
    #[serde(rename = "condutaInicial")]
    pub initial_plan: String,

    // Training-mode answer key. Never shown to the student.
    #[serde(rename = "diagnosticoCorreto", skip_serializing_if = "Option::is_none")]
    pub correct_diagnosis: Option<String>,
    #[serde(rename = "resumoDiagnostico", skip_serializing_if = "Option::is_none")]
    pub diagnosis_rationale: Option<String>,
    #[serde(rename = "hiddenPhysicalExam", skip_serializing_if = "Option::is_none")]
    pub hidden_physical_exam: Option<String>,
    #[serde(rename = "hiddenLabResults", skip_serializing_if = "Option::is_none")]
    pub hidden_lab_results: Option<String>,
}

impl AnamnesisData {
    /// Normalize values that arrive from the model or from imported files.
    ///
    /// The age keeps only its first run of digits (`"45 anos"` → `"45"`).
    pub fn clean(mut self) -> Self {
        if !self.age.is_empty() {
            self.age = first_digit_run(&self.age);
        }
        self
    }

    /// Length of the trimmed `chief complaint + " " + HPI` text.
    pub fn combined_complaint_len(&self) -> usize {
        format!("{} {}", self.chief_complaint, self.hpi)
            .trim()
            .chars()
            .count()
    }

    /// Whether there is enough complaint text to request an analysis.
    pub fn is_ready_for_analysis(&self) -> bool {
        self.combined_complaint_len() >= MIN_COMPLAINT_LEN
    }

    /// Whether this record carries a training-mode answer key.
    pub fn is_training_case(&self) -> bool {
        self.correct_diagnosis
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// The visible fields in form order.
    pub fn visible_fields(&self) -> [&str; 18] {
        [
            &self.age,
            &self.sex,
            &self.comorbidities,
            &self.current_medications,
            &self.allergies,
            &self.past_history,
            &self.chief_complaint,
            &self.hpi,
            &self.blood_pressure,
            &self.heart_rate,
            &self.respiratory_rate,
            &self.temperature,
            &self.spo2,
            &self.weight_height,
            &self.physical_exam,
            &self.exam_results,
            &self.diagnostic_hypotheses,
            &self.initial_plan,
        ]
    }

    /// All visible field values joined by a space.
    ///
    /// The hidden training fields are excluded so that checklist hints never
    /// reveal the answer key.
    pub fn free_text(&self) -> String {
        self.visible_fields().join(" ")
    }

    /// Drop the training answer key, returning what the student may see.
    pub fn without_answer_key(&self) -> Self {
        Self {
            correct_diagnosis: None,
            diagnosis_rationale: None,
            hidden_physical_exam: None,
            hidden_lab_results: None,
            ..self.clone()
        }
    }
}
