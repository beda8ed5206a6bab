use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Justification attached to diagnoses typed in by the user.
pub const CUSTOM_DIAGNOSIS_RATIONALE: &str = "Diagnóstico inserido manualmente para investigação.";

/// A candidate diagnosis returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(rename = "diagnostico")]
    pub name: String,
    /// Estimated probability, 0–100. Out-of-range values are clamped.
    #[serde(rename = "probabilidade", deserialize_with = "deserialize_percent")]
    pub probability: u8,
    #[serde(rename = "justificativa", default)]
    pub rationale: String,
}

impl Diagnosis {
    pub fn new(name: impl Into<String>, probability: u8, rationale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probability: probability.min(100),
            rationale: rationale.into(),
        }
    }

    /// A user-entered diagnosis with indeterminate probability.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(name, 0, CUSTOM_DIAGNOSIS_RATIONALE)
    }
}

/// Deserialize any JSON number into a 0–100 percentage.
pub(crate) fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// The raw two-list answer of a diagnosis request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    #[serde(rename = "diagnosticosProvaveis", default)]
    pub probable: Vec<Diagnosis>,
    #[serde(rename = "diagnosticosDiferenciais", default)]
    pub differential: Vec<Diagnosis>,
}

/// A question or exam finding that helps confirm or rule out a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    #[serde(rename = "justificativa", default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementPlan {
    #[serde(rename = "examesConfirmacao", default)]
    pub confirmation_tests: Vec<String>,
    #[serde(rename = "medicacoesSugeridas", default)]
    pub suggested_medications: Vec<String>,
    #[serde(rename = "encaminhamentos", default)]
    pub referrals: Vec<String>,
}

impl ManagementPlan {
    pub fn is_empty(&self) -> bool {
        self.confirmation_tests.is_empty()
            && self.suggested_medications.is_empty()
            && self.referrals.is_empty()
    }
}

/// Checklist and management plan for one selected diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisDetail {
    #[serde(rename = "checklistAnamnese", default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(rename = "planoConduta", default)]
    pub plan: ManagementPlan,
}

/// Answers gathered while working through a checklist, plus the parts of the
/// plan that were actually carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroFeedback {
    /// Checklist item text → the clinician's answer.
    #[serde(rename = "checklistUpdates", default)]
    pub checklist_updates: BTreeMap<String, String>,
    #[serde(rename = "conductedPlan", default)]
    pub conducted_plan: ManagementPlan,
}

impl RetroFeedback {
    pub fn is_empty(&self) -> bool {
        self.checklist_updates.values().all(|v| v.trim().is_empty()) && self.conducted_plan.is_empty()
    }
}
