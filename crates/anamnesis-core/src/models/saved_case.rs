use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::anamnesis::AnamnesisData;
use super::diagnosis::Diagnosis;
use super::timeline::TimelineEvent;
use crate::reconcile::ReconciledDiagnoses;

/// A snapshot of a clinical case kept in the local case history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCase {
    pub id: String,
    pub name: String,
    pub saved_at: jiff::Timestamp,
    pub anamnesis_data: AnamnesisData,
    #[serde(default)]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(default)]
    pub differential_diagnoses: Vec<Diagnosis>,
    #[serde(default)]
    pub timeline_events: Vec<TimelineEvent>,
}

impl SavedCase {
    /// Snapshot the current case, named after the local save time.
    pub fn new(
        anamnesis: AnamnesisData,
        diagnoses: &ReconciledDiagnoses,
        timeline: Vec<TimelineEvent>,
    ) -> Self {
        let now = jiff::Zoned::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("Paciente - {}", now.strftime("%d/%m/%Y %H:%M:%S")),
            saved_at: now.timestamp(),
            anamnesis_data: anamnesis,
            diagnoses: diagnoses.probable.clone(),
            differential_diagnoses: diagnoses.differential.clone(),
            timeline_events: timeline,
        }
    }

    /// The stored diagnoses as a reconciled pair.
    pub fn reconciled(&self) -> ReconciledDiagnoses {
        ReconciledDiagnoses {
            probable: self.diagnoses.clone(),
            differential: self.differential_diagnoses.clone(),
        }
    }
}
