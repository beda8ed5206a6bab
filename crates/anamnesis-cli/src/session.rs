//! User workflows over the [`Store`]: each one issues the model calls it
//! needs, dispatches the resulting transitions, and returns the outcome.

use std::path::Path;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use anamnesis_core::checklist::{AnnotatedChecklistItem, annotate};
use anamnesis_core::models::academic::AcademicSearchResult;
use anamnesis_core::models::anamnesis::{AnamnesisData, MIN_COMPLAINT_LEN};
use anamnesis_core::models::diagnosis::{Diagnosis, RetroFeedback};
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::training::{
    Difficulty, EntryKind, EvaluationResult, Specialty, StudentHypotheses, StudentPlan,
};
use anamnesis_core::reconcile::{ReconciledDiagnoses, reconcile_diagnoses};
use anamnesis_export::render::render_anamnesis;
use anamnesis_gemini::assistant::Assistant;
use anamnesis_gemini::client::GenerativeModel;
use anamnesis_gemini::error::GeminiError;
use anamnesis_storage::cases::CaseStore;

use crate::error::{ImportError, SessionError};
use crate::import::{self, Document};
use crate::state::{Action, AppState, DetailPanel, Mode, Store};

pub const INVESTIGATION_FAILED: &str = "Erro ao buscar resultado da investigação.";
pub const EVALUATION_FAILED: &str = "Falha ao avaliar a análise do estudante.";

pub struct Session<M> {
    assistant: Assistant<M>,
    store: Store,
    cases: Option<CaseStore>,
}

impl<M: GenerativeModel> Session<M> {
    pub fn new(assistant: Assistant<M>) -> Self {
        Self {
            assistant,
            store: Store::default(),
            cases: None,
        }
    }

    pub fn with_case_store(mut self, cases: CaseStore) -> Self {
        self.cases = Some(cases);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn assistant(&self) -> &Assistant<M> {
        &self.assistant
    }

    pub async fn snapshot(&self) -> AppState {
        self.store.snapshot().await
    }

    fn cases(&self) -> Result<&CaseStore, SessionError> {
        self.cases.as_ref().ok_or(SessionError::NoCaseStore)
    }

    async fn fail<E: Into<SessionError>>(&self, error: E) -> SessionError {
        let error = error.into();
        self.store.dispatch(Action::SetError(Some(error.to_string()))).await;
        error
    }

    // ── Assisted diagnosis ───────────────────────────────────────────────────

    /// Replace the anamnesis and analyze it.
    pub async fn analyze(&self, data: AnamnesisData) -> Result<ReconciledDiagnoses, SessionError> {
        self.store.dispatch(Action::SetAnamnesis(data)).await;
        self.run_analysis().await
    }

    /// Fetch diagnoses and the timeline for the current anamnesis.
    ///
    /// Both calls run concurrently and are applied together. In training mode
    /// a timeline already in place is kept instead of being fetched again.
    pub async fn run_analysis(&self) -> Result<ReconciledDiagnoses, SessionError> {
        let state = self.store.snapshot().await;
        let len = state.anamnesis.combined_complaint_len();
        if len < MIN_COMPLAINT_LEN {
            self.store.dispatch(Action::AnalysisRejected).await;
            return Err(SessionError::ComplaintTooShort {
                len,
                min: MIN_COMPLAINT_LEN,
            });
        }

        self.analysis_pass(&state).await
    }

    /// One analysis over the anamnesis in `state`, without the complaint
    /// length check.
    async fn analysis_pass(&self, state: &AppState) -> Result<ReconciledDiagnoses, SessionError> {
        let data = &state.anamnesis;
        let reuse_timeline = state.mode == Mode::Training && !state.timeline.is_empty();
        let generation = self.store.dispatch(Action::AnalysisStarted).await.analysis;
        info!(generation, reuse_timeline, "analysis started");

        let timeline = async {
            if reuse_timeline {
                return Ok(None);
            }
            Ok::<_, GeminiError>(Some(self.assistant.fetch_timeline(&data.hpi).await))
        };

        match tokio::try_join!(self.assistant.fetch_diagnoses(data), timeline) {
            Ok((response, timeline)) => {
                let diagnoses = reconcile_diagnoses(response.probable, response.differential);
                info!(
                    generation,
                    probable = diagnoses.probable.len(),
                    differential = diagnoses.differential.len(),
                    "analysis complete"
                );
                self.store
                    .dispatch(Action::AnalysisCompleted {
                        generation,
                        diagnoses: diagnoses.clone(),
                        timeline,
                    })
                    .await;
                Ok(diagnoses)
            }
            Err(e) => {
                warn!(generation, error = %e, "analysis failed");
                self.store.dispatch(Action::AnalysisFailed { generation }).await;
                Err(e.into())
            }
        }
    }

    /// Select a diagnosis by name: the analyzed one when it exists, otherwise
    /// a manually entered one.
    pub async fn select_by_name(&self, name: &str) {
        let state = self.store.snapshot().await;
        let diagnosis = state
            .diagnoses
            .find(name)
            .cloned()
            .unwrap_or_else(|| Diagnosis::custom(name.trim()));
        if !state.is_selected(&diagnosis.name) {
            self.store.dispatch(Action::ToggleSelection(diagnosis)).await;
        }
    }

    pub async fn select_custom(&self, name: &str) {
        self.store.dispatch(Action::SelectCustom(name.to_string())).await;
    }

    /// Fetch the details of every selected diagnosis concurrently.
    ///
    /// Each detail is applied to the panel as soon as it arrives. Failures
    /// are recorded per diagnosis and do not abort the others.
    pub async fn investigate_selected(&self) -> Result<DetailPanel, SessionError> {
        let state = self.store.snapshot().await;
        if state.selected.is_empty() {
            return Err(SessionError::NothingSelected);
        }
        let generation = self.store.dispatch(Action::DetailsOpened).await.details;
        info!(generation, count = state.selected.len(), "fetching diagnosis details");

        let data = &state.anamnesis;
        let mut pending: FuturesUnordered<_> = state
            .selected
            .iter()
            .map(|diagnosis| async move {
                (diagnosis, self.assistant.fetch_diagnosis_details(data, diagnosis).await)
            })
            .collect();

        while let Some((diagnosis, result)) = pending.next().await {
            let action = match result {
                Ok(detail) => Action::DetailLoaded {
                    generation,
                    name: diagnosis.name.clone(),
                    detail,
                },
                Err(e) => {
                    warn!(diagnosis = %diagnosis.name, error = %e, "diagnosis detail failed");
                    Action::DetailFailed {
                        generation,
                        name: diagnosis.name.clone(),
                        error: e.to_string(),
                    }
                }
            };
            self.store.dispatch(action).await;
        }

        Ok(self.store.snapshot().await.details)
    }

    /// The merged checklist of the open panel, each item flagged when the
    /// anamnesis already seems to cover it.
    pub async fn annotated_checklist(&self) -> Vec<AnnotatedChecklistItem> {
        let state = self.store.snapshot().await;
        annotate(&state.details.merged().checklist, &state.anamnesis.free_text())
    }

    /// Fold the clinician's feedback into the anamnesis and analyze again.
    pub async fn reevaluate(&self, feedback: &RetroFeedback) -> Result<ReconciledDiagnoses, SessionError> {
        self.store.dispatch(Action::DetailsClosed).await;
        let current = self.store.snapshot().await.anamnesis;
        let updated = self.assistant.integrate_feedback(&current, feedback).await;
        self.store.dispatch(Action::SetAnamnesis(updated)).await;
        self.run_analysis().await
    }

    /// Fold the clinician's feedback into a final anamnesis without touching
    /// the current one.
    pub async fn finalize(&self, feedback: &RetroFeedback) -> AnamnesisData {
        self.store.dispatch(Action::DetailsClosed).await;
        let current = self.store.snapshot().await.anamnesis;
        self.assistant.integrate_feedback(&current, feedback).await
    }

    /// Adopt an edited final text: parse it back into fields and analyze.
    pub async fn apply_final_text(&self, text: &str) -> Result<ReconciledDiagnoses, SessionError> {
        let parsed = match self.assistant.parse_anamnesis_text(text).await {
            Ok(parsed) => parsed,
            Err(e) => return Err(self.fail(e).await),
        };
        self.analyze(parsed).await
    }

    pub async fn render_current(&self) -> Result<String, SessionError> {
        let state = self.store.snapshot().await;
        Ok(render_anamnesis(&state.anamnesis)?)
    }

    /// A concise chart entry for the current anamnesis.
    pub async fn prontuary_summary(&self) -> Result<String, SessionError> {
        let text = self.render_current().await?;
        Ok(self.assistant.generate_prontuary_summary(&text).await?)
    }

    pub async fn academic_search(&self, diagnosis: &str) -> Result<AcademicSearchResult, SessionError> {
        Ok(self.assistant.fetch_academic_publications(diagnosis).await?)
    }

    // ── Training mode ────────────────────────────────────────────────────────

    /// Generate a new simulated case and return what the student may see.
    pub async fn start_training(
        &self,
        difficulty: Difficulty,
        specialty: Specialty,
    ) -> Result<AnamnesisData, SessionError> {
        self.store
            .dispatch(Action::TrainingStarted {
                difficulty,
                specialty,
            })
            .await;

        match self.assistant.generate_test_case(difficulty, specialty).await {
            Ok(case) => {
                let visible = case.without_answer_key();
                self.store.dispatch(Action::TrainingCaseLoaded(case)).await;
                Ok(visible)
            }
            Err(e) => {
                warn!(%difficulty, %specialty, error = %e, "training case generation failed");
                self.store.dispatch(Action::TrainingFailed).await;
                Err(e.into())
            }
        }
    }

    /// Ask the simulator for an exam or finding. The request and its answer,
    /// or a system error entry, are appended to the investigation log.
    pub async fn investigate(&self, request: &str) -> Result<String, SessionError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(SessionError::EmptyRequest);
        }
        let state = self.store.snapshot().await;
        if state.mode != Mode::Training || !state.anamnesis.is_training_case() {
            return Err(SessionError::NotTraining);
        }

        self.store
            .dispatch(Action::LogAppended {
                kind: EntryKind::Request,
                content: request.to_string(),
            })
            .await;

        let data = &state.anamnesis;
        let result = self
            .assistant
            .fetch_investigation_result(
                request,
                data.hidden_physical_exam.as_deref().unwrap_or_default(),
                data.hidden_lab_results.as_deref().unwrap_or_default(),
            )
            .await;

        match result {
            Ok(answer) => {
                self.store
                    .dispatch(Action::LogAppended {
                        kind: EntryKind::Response,
                        content: answer.clone(),
                    })
                    .await;
                Ok(answer)
            }
            Err(e) => {
                warn!(error = %e, "investigation request failed");
                self.store
                    .dispatch(Action::LogAppended {
                        kind: EntryKind::System,
                        content: INVESTIGATION_FAILED.to_string(),
                    })
                    .await;
                Err(e.into())
            }
        }
    }

    /// Score the student's hypotheses and plan while the assistant's own
    /// analysis runs alongside for comparison. The generated case is analyzed
    /// whatever the length of its complaint.
    pub async fn submit_student_analysis(
        &self,
        hypotheses: &StudentHypotheses,
        plan: &StudentPlan,
    ) -> Result<EvaluationResult, SessionError> {
        if hypotheses.principal.trim().is_empty() {
            return Err(SessionError::MissingHypothesis);
        }
        let state = self.store.snapshot().await;
        if state.mode != Mode::Training || !state.anamnesis.is_training_case() {
            return Err(SessionError::NotTraining);
        }
        self.store.dispatch(Action::EvaluationStarted).await;

        let evaluation = self.assistant.evaluate_student_performance(
            &state.anamnesis,
            hypotheses,
            &state.investigation_log,
            plan,
        );
        let (evaluation, analysis) = tokio::join!(evaluation, self.analysis_pass(&state));
        if let Err(e) = analysis {
            warn!(error = %e, "comparison analysis failed");
        }

        match evaluation {
            Ok(result) => {
                info!(score = result.score, "student analysis evaluated");
                self.store.dispatch(Action::EvaluationCompleted(result.clone())).await;
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "student evaluation failed");
                self.store
                    .dispatch(Action::EvaluationFailed(EVALUATION_FAILED.to_string()))
                    .await;
                Err(e.into())
            }
        }
    }

    // ── Import ───────────────────────────────────────────────────────────────

    async fn document_text(&self, path: &Path) -> Result<String, SessionError> {
        let text = match import::read_document(path).await? {
            Document::Text(text) => text,
            Document::Pdf(bytes) => self.assistant.extract_document_text(&bytes).await?,
        };
        if text.trim().is_empty() {
            return Err(ImportError::Empty(path.to_path_buf()).into());
        }
        Ok(text)
    }

    /// Start a new case from a `.txt` or `.pdf` anamnesis.
    pub async fn import_anamnesis_file(&self, path: &Path) -> Result<AnamnesisData, SessionError> {
        self.store.dispatch(Action::Reset).await;
        let parsed = async {
            let text = self.document_text(path).await?;
            Ok::<_, SessionError>(self.assistant.parse_anamnesis_text(&text).await?)
        };
        match parsed.await {
            Ok(data) => {
                info!(path = %path.display(), "anamnesis imported");
                self.store.dispatch(Action::SetAnamnesis(data.clone())).await;
                Ok(data)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Summarize a lab report into the exam results of the current case.
    pub async fn import_exam_file(&self, path: &Path) -> Result<String, SessionError> {
        self.store.dispatch(Action::SetError(None)).await;
        let summary = async {
            let text = self.document_text(path).await?;
            Ok::<_, SessionError>(self.assistant.summarize_exam_results(&text).await?)
        };
        match summary.await {
            Ok(summary) => {
                self.store.dispatch(Action::SetExamResults(summary.clone())).await;
                Ok(summary)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Start a new case from a recorded interview.
    pub async fn import_audio(&self, path: &Path) -> Result<AnamnesisData, SessionError> {
        self.store.dispatch(Action::Reset).await;
        let transcribed = async {
            let recording = import::read_audio(path).await?;
            Ok::<_, SessionError>(
                self.assistant
                    .transcribe_anamnesis_audio(&recording.bytes, recording.mime_type)
                    .await?,
            )
        };
        match transcribed.await {
            Ok(data) => {
                self.store.dispatch(Action::SetAnamnesis(data.clone())).await;
                Ok(data)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    // ── Case history ─────────────────────────────────────────────────────────

    /// Snapshot the current case into the history.
    pub async fn save_current_case(&self) -> Result<SavedCase, SessionError> {
        let cases = self.cases()?;
        let state = self.store.snapshot().await;
        if state.mode == Mode::Training {
            return Err(SessionError::TrainingCaseNotSaved);
        }
        let case = SavedCase::new(state.anamnesis, &state.diagnoses, state.timeline);
        cases.save_case(case.clone()).await?;
        info!(id = %case.id, "case saved");
        Ok(case)
    }

    /// Restore a saved case in clinical mode.
    pub async fn load_case(&self, id: &str) -> Result<SavedCase, SessionError> {
        let case = self
            .cases()?
            .find_case(id)
            .await
            .ok_or_else(|| SessionError::CaseNotFound(id.to_string()))?;
        self.store.dispatch(Action::CaseLoaded(case.clone())).await;
        Ok(case)
    }

    pub async fn list_cases(&self) -> Result<Vec<SavedCase>, SessionError> {
        Ok(self.cases()?.load_cases().await)
    }

    pub async fn delete_case(&self, id: &str) -> Result<Vec<SavedCase>, SessionError> {
        Ok(self.cases()?.delete_case(id).await?)
    }
}
