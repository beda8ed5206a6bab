//! Application state and the reducer that owns every transition.
//!
//! Async workflows never touch [`AppState`] directly: they dispatch
//! [`Action`]s through a [`Store`]. Analyses and detail-panel openings each
//! take a fresh generation number, and completions carrying an older number
//! are dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::{Diagnosis, DiagnosisDetail};
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::timeline::TimelineEvent;
use anamnesis_core::models::training::{
    Difficulty, EntryKind, EvaluationResult, InvestigationLog, Specialty,
};
use anamnesis_core::reconcile::{MergedDetails, ReconciledDiagnoses, merge_details};

pub const ANALYSIS_REJECTED: &str =
    "Por favor, preencha a Queixa Principal e a HDA com mais detalhes antes de analisar.";
pub const ANALYSIS_FAILED: &str =
    "Falha ao obter diagnósticos. Verifique sua conexão ou a chave de API.";
pub const TRAINING_FAILED: &str = "Falha ao gerar o caso de teste. Tente novamente.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Clinical,
    Training,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DetailSlot {
    Loading,
    Loaded(DiagnosisDetail),
    Failed(String),
}

/// Details being fetched for the selected diagnoses, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailPanel {
    pub generation: u64,
    pub open: bool,
    pub slots: Vec<(Diagnosis, DetailSlot)>,
}

impl DetailPanel {
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, DetailSlot::Loading))
            .count()
    }

    /// Union of every detail loaded so far.
    pub fn merged(&self) -> MergedDetails {
        merge_details(self.slots.iter().filter_map(|(diagnosis, slot)| match slot {
            DetailSlot::Loaded(detail) => Some((diagnosis.name.as_str(), detail)),
            _ => None,
        }))
    }

    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.slots
            .iter()
            .filter_map(|(diagnosis, slot)| match slot {
                DetailSlot::Failed(error) => Some((diagnosis.name.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub mode: Mode,
    pub anamnesis: AnamnesisData,
    pub analysis: AnalysisStatus,
    pub analysis_generation: u64,
    pub diagnoses: ReconciledDiagnoses,
    pub timeline: Vec<TimelineEvent>,
    pub selected: Vec<Diagnosis>,
    pub details: DetailPanel,
    pub investigation_log: InvestigationLog,
    pub evaluation: Option<EvaluationResult>,
    pub error: Option<String>,
}

impl AppState {
    /// Whether a new analysis may reuse the timeline already on screen.
    pub fn keeps_timeline(&self) -> bool {
        self.mode == Mode::Training && !self.timeline.is_empty()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|d| d.name == name)
    }

    fn reset(&mut self) {
        self.anamnesis = AnamnesisData::default();
        self.analysis = AnalysisStatus::Idle;
        self.analysis_generation += 1;
        self.diagnoses = ReconciledDiagnoses::default();
        self.timeline.clear();
        self.selected.clear();
        self.details = DetailPanel {
            generation: self.details.generation + 1,
            ..DetailPanel::default()
        };
        self.investigation_log = InvestigationLog::new();
        self.evaluation = None;
        self.error = None;
    }
}

/// Every state transition.
#[derive(Debug, Clone)]
pub enum Action {
    /// Blank case in the current mode. In-flight results become stale.
    Reset,
    /// Switch mode; a change of mode also resets the case.
    SetMode(Mode),
    SetAnamnesis(AnamnesisData),
    SetExamResults(String),
    /// Starts a new analysis generation.
    AnalysisStarted,
    /// The complaint was too short to analyze.
    AnalysisRejected,
    AnalysisCompleted {
        generation: u64,
        diagnoses: ReconciledDiagnoses,
        /// `None` keeps the timeline already in place.
        timeline: Option<Vec<TimelineEvent>>,
    },
    AnalysisFailed {
        generation: u64,
    },
    /// Toggle a diagnosis in the selection, matched by exact name.
    ToggleSelection(Diagnosis),
    /// Replace the selection with one manually entered diagnosis.
    SelectCustom(String),
    ClearSelection,
    /// Opens the detail panel for the current selection with a new generation.
    DetailsOpened,
    DetailLoaded {
        generation: u64,
        name: String,
        detail: DiagnosisDetail,
    },
    DetailFailed {
        generation: u64,
        name: String,
        error: String,
    },
    DetailsClosed,
    TrainingStarted {
        difficulty: Difficulty,
        specialty: Specialty,
    },
    TrainingCaseLoaded(AnamnesisData),
    TrainingFailed,
    LogAppended {
        kind: EntryKind,
        content: String,
    },
    EvaluationStarted,
    EvaluationCompleted(EvaluationResult),
    EvaluationFailed(String),
    /// Restore a saved case. Always lands in clinical mode.
    CaseLoaded(SavedCase),
    SetError(Option<String>),
}

/// The generation counters after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generations {
    pub analysis: u64,
    pub details: u64,
}

pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::Reset => state.reset(),
        Action::SetMode(mode) => {
            if state.mode != mode {
                state.reset();
                state.mode = mode;
            }
        }
        Action::SetAnamnesis(data) => state.anamnesis = data,
        Action::SetExamResults(text) => state.anamnesis.exam_results = text,
        Action::AnalysisStarted => {
            state.analysis_generation += 1;
            state.analysis = AnalysisStatus::Loading;
            state.error = None;
            state.diagnoses = ReconciledDiagnoses::default();
            state.selected.clear();
            state.details = DetailPanel {
                generation: state.details.generation + 1,
                ..DetailPanel::default()
            };
            if !state.keeps_timeline() {
                state.timeline.clear();
            }
        }
        Action::AnalysisRejected => {
            state.analysis = AnalysisStatus::Failed;
            state.diagnoses = ReconciledDiagnoses::default();
            state.error = Some(ANALYSIS_REJECTED.to_string());
        }
        Action::AnalysisCompleted {
            generation,
            diagnoses,
            timeline,
        } => {
            if generation != state.analysis_generation {
                debug!(generation, current = state.analysis_generation, "dropping stale analysis");
                return;
            }
            state.analysis = AnalysisStatus::Ready;
            state.diagnoses = diagnoses;
            if let Some(timeline) = timeline {
                state.timeline = timeline;
            }
        }
        Action::AnalysisFailed { generation } => {
            if generation != state.analysis_generation {
                debug!(generation, current = state.analysis_generation, "dropping stale analysis failure");
                return;
            }
            state.analysis = AnalysisStatus::Failed;
            state.diagnoses = ReconciledDiagnoses::default();
            state.timeline.clear();
            state.error = Some(ANALYSIS_FAILED.to_string());
        }
        Action::ToggleSelection(diagnosis) => {
            match state.selected.iter().position(|d| d.name == diagnosis.name) {
                Some(i) => {
                    state.selected.remove(i);
                }
                None => state.selected.push(diagnosis),
            }
        }
        Action::SelectCustom(name) => {
            let name = name.trim();
            if !name.is_empty() {
                state.selected = vec![Diagnosis::custom(name)];
            }
        }
        Action::ClearSelection => state.selected.clear(),
        Action::DetailsOpened => {
            state.details = DetailPanel {
                generation: state.details.generation + 1,
                open: true,
                slots: state
                    .selected
                    .iter()
                    .map(|d| (d.clone(), DetailSlot::Loading))
                    .collect(),
            };
        }
        Action::DetailLoaded {
            generation,
            name,
            detail,
        } => fill_slot(state, generation, &name, DetailSlot::Loaded(detail)),
        Action::DetailFailed {
            generation,
            name,
            error,
        } => fill_slot(state, generation, &name, DetailSlot::Failed(error)),
        Action::DetailsClosed => {
            state.details = DetailPanel {
                generation: state.details.generation + 1,
                ..DetailPanel::default()
            };
            state.selected.clear();
        }
        Action::TrainingStarted {
            difficulty,
            specialty,
        } => {
            state.reset();
            state.mode = Mode::Training;
            state.investigation_log.push(
                EntryKind::System,
                format!(
                    "Novo caso clínico (Especialidade: {specialty}, Dificuldade: {difficulty}) gerado. \
                     Inicie sua investigação."
                ),
            );
        }
        Action::TrainingCaseLoaded(case) => state.anamnesis = case,
        Action::TrainingFailed => {
            state.investigation_log = InvestigationLog::new();
            state.error = Some(TRAINING_FAILED.to_string());
        }
        Action::LogAppended { kind, content } => {
            state.investigation_log.push(kind, content);
        }
        Action::EvaluationStarted => {
            state.evaluation = None;
            state.error = None;
        }
        Action::EvaluationCompleted(result) => state.evaluation = Some(result),
        Action::EvaluationFailed(error) => state.error = Some(error),
        Action::CaseLoaded(case) => {
            state.reset();
            state.mode = Mode::Clinical;
            state.diagnoses = case.reconciled();
            state.analysis = AnalysisStatus::Ready;
            state.anamnesis = case.anamnesis_data.clean();
            state.timeline = case.timeline_events;
        }
        Action::SetError(error) => state.error = error,
    }
}

fn fill_slot(state: &mut AppState, generation: u64, name: &str, value: DetailSlot) {
    if generation != state.details.generation {
        debug!(generation, current = state.details.generation, name, "dropping stale detail");
        return;
    }
    match state.details.slots.iter_mut().find(|(d, _)| d.name == name) {
        Some((_, slot)) => *slot = value,
        None => debug!(name, "detail for a diagnosis that is not in the panel"),
    }
}

/// Shared handle to the application state.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<AppState>>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Apply `action` and report the generation counters it left behind.
    pub async fn dispatch(&self, action: Action) -> Generations {
        let mut state = self.inner.lock().await;
        reduce(&mut state, action);
        Generations {
            analysis: state.analysis_generation,
            details: state.details.generation,
        }
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.lock().await.clone()
    }
}
