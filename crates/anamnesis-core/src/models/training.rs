use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::diagnosis::deserialize_percent;
use crate::text::fold_diacritics;

// ── Investigation log ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Request,
    Response,
    System,
}

/// One step of a simulated investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationLogEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: jiff::Timestamp,
}

/// Append-only record of a training investigation.
///
/// Entries can only be pushed; there is no way to edit or remove one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestigationLog {
    entries: Vec<InvestigationLogEntry>,
}

impl InvestigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn push(&mut self, kind: EntryKind, content: impl Into<String>) -> &InvestigationLogEntry {
        self.push_entry(InvestigationLogEntry {
            kind,
            content: content.into(),
            timestamp: jiff::Timestamp::now(),
        })
    }

    pub fn push_entry(&mut self, entry: InvestigationLogEntry) -> &InvestigationLogEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[InvestigationLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvestigationLogEntry> {
        self.entries.iter()
    }

    /// Render the log as one line per entry for inclusion in a prompt.
    pub fn to_prompt_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                let who = match entry.kind {
                    EntryKind::Request => "Estudante solicitou",
                    EntryKind::Response => "Simulador respondeu",
                    EntryKind::System => "Sistema",
                };
                format!("{who}: {}", entry.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Student submission and evaluation ────────────────────────────────────────

/// The management plan a student submits at the end of a simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPlan {
    #[serde(rename = "solicitacaoExames", default)]
    pub requested_exams: String,
    #[serde(rename = "prescricao", default)]
    pub prescription: String,
    #[serde(rename = "encaminhamentos", default)]
    pub referrals: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentHypotheses {
    pub principal: String,
    #[serde(rename = "diferenciais", default)]
    pub differentials: Vec<String>,
}

impl StudentHypotheses {
    /// Whether the principal hypothesis names the case's correct diagnosis
    /// (trimmed, case-insensitive).
    pub fn principal_matches(&self, correct: &str) -> bool {
        let correct = correct.trim();
        !correct.is_empty() && self.principal.trim().to_lowercase() == correct.to_lowercase()
    }
}

/// The preceptor's scored feedback on a simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Final score, 0–100.
    #[serde(deserialize_with = "deserialize_percent")]
    pub score: u8,
    #[serde(rename = "scoreJustificativa", default)]
    pub score_rationale: String,
    #[serde(rename = "pontosPositivos", default)]
    pub strengths: String,
    #[serde(rename = "pontosMelhorar", default)]
    pub improvements: String,
    #[serde(rename = "raciocinioCorreto", default)]
    pub correct_reasoning: String,
    #[serde(rename = "analiseDaConduta", default)]
    pub conduct_analysis: String,
}

// ── Case generation parameters ───────────────────────────────────────────────

/// Medical area a generated training case must belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    #[default]
    #[serde(rename = "Geral")]
    General,
    #[serde(rename = "Cardiologia")]
    Cardiology,
    #[serde(rename = "Pneumologia")]
    Pulmonology,
    #[serde(rename = "Neurologia")]
    Neurology,
    #[serde(rename = "Gastroenterologia")]
    Gastroenterology,
    #[serde(rename = "Nefrologia")]
    Nephrology,
    #[serde(rename = "Pediatria")]
    Pediatrics,
    #[serde(rename = "Emergência")]
    Emergency,
    #[serde(rename = "Gineco/Obstetricia")]
    ObstetricsGynecology,
    #[serde(rename = "Ortopedia")]
    Orthopedics,
}

impl Specialty {
    pub const ALL: [Specialty; 10] = [
        Specialty::General,
        Specialty::Cardiology,
        Specialty::Pulmonology,
        Specialty::Neurology,
        Specialty::Gastroenterology,
        Specialty::Nephrology,
        Specialty::Pediatrics,
        Specialty::Emergency,
        Specialty::ObstetricsGynecology,
        Specialty::Orthopedics,
    ];

    /// Display label, as shown to users and sent in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Specialty::General => "Geral",
            Specialty::Cardiology => "Cardiologia",
            Specialty::Pulmonology => "Pneumologia",
            Specialty::Neurology => "Neurologia",
            Specialty::Gastroenterology => "Gastroenterologia",
            Specialty::Nephrology => "Nefrologia",
            Specialty::Pediatrics => "Pediatria",
            Specialty::Emergency => "Emergência",
            Specialty::ObstetricsGynecology => "Gineco/Obstetricia",
            Specialty::Orthopedics => "Ortopedia",
        }
    }

    /// ASCII command-line spelling, e.g. `gineco-obstetricia`.
    pub fn slug(self) -> &'static str {
        match self {
            Specialty::General => "geral",
            Specialty::Cardiology => "cardiologia",
            Specialty::Pulmonology => "pneumologia",
            Specialty::Neurology => "neurologia",
            Specialty::Gastroenterology => "gastroenterologia",
            Specialty::Nephrology => "nefrologia",
            Specialty::Pediatrics => "pediatria",
            Specialty::Emergency => "emergencia",
            Specialty::ObstetricsGynecology => "gineco-obstetricia",
            Specialty::Orthopedics => "ortopedia",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Specialty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold_diacritics(s.trim());
        Specialty::ALL
            .into_iter()
            .find(|sp| wanted == sp.slug() || wanted == fold_diacritics(sp.label()))
            .ok_or_else(|| CoreError::UnknownSpecialty(s.to_string()))
    }
}

/// How hard a generated training case should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil")]
    Easy,
    #[default]
    #[serde(rename = "Intermediário")]
    Intermediate,
    #[serde(rename = "Difícil")]
    Hard,
    #[serde(rename = "Extremo")]
    Extreme,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Intermediate,
        Difficulty::Hard,
        Difficulty::Extreme,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Intermediate => "Intermediário",
            Difficulty::Hard => "Difícil",
            Difficulty::Extreme => "Extremo",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold_diacritics(s.trim());
        Difficulty::ALL
            .into_iter()
            .find(|d| wanted == fold_diacritics(d.label()))
            .ok_or_else(|| CoreError::UnknownDifficulty(s.to_string()))
    }
}
