//! Clinical operations built on a [`GenerativeModel`].
//!
//! Each operation builds its prompt, picks its sampling parameters, runs the
//! call through [`call_with_retry`] and validates the answer against the
//! typed model it expects. Structured answers that do not deserialize are
//! reported as [`GeminiError::SchemaViolation`].

use std::time::Instant;

use anamnesis_core::models::academic::AcademicSearchResult;
use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::{Diagnosis, DiagnosisDetail, DiagnosisResponse, RetroFeedback};
use anamnesis_core::models::timeline::TimelineEvent;
use anamnesis_core::models::training::{
    Difficulty, EvaluationResult, InvestigationLog, Specialty, StudentHypotheses, StudentPlan,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{GenerateRequest, GenerateResponse, GenerationConfig, GenerativeModel, Part};
use crate::error::GeminiError;
use crate::prompts;
use crate::retry::{RetryPolicy, call_with_retry};
use crate::schema;

/// HDA texts shorter than this (after trimming) yield no timeline request.
pub const MIN_TIMELINE_HDA_LEN: usize = 10;

const PDF_MIME_TYPE: &str = "application/pdf";

const ACADEMIC_FALLBACK_GUIDELINES: &str =
    "Não foi possível extrair as diretrizes de tratamento de forma estruturada.";
const ACADEMIC_FALLBACK_FINDINGS: &str =
    "Não foi possível extrair as descobertas recentes de forma estruturada.";

pub struct Assistant<M> {
    model: M,
    retry: RetryPolicy,
}

impl<M: GenerativeModel> Assistant<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn generate(
        &self,
        operation: &'static str,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!(request_id = %request_id, operation, "sending model request");

        let response = call_with_retry(&self.retry, || self.model.generate(&request)).await?;

        info!(
            request_id = %request_id,
            operation,
            input_tokens = response.usage.input,
            output_tokens = response.usage.output,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model request complete"
        );
        Ok(response)
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: GenerateRequest,
    ) -> Result<T, GeminiError> {
        let response = self.generate(operation, request).await?;
        parse_json(operation, &response.text)
    }

    async fn generate_text(
        &self,
        operation: &'static str,
        request: GenerateRequest,
    ) -> Result<String, GeminiError> {
        let response = self.generate(operation, request).await?;
        Ok(response.text.trim().to_string())
    }

    // ── Assisted diagnosis ───────────────────────────────────────────────────

    /// Probable and differential diagnoses for an anamnesis, unreconciled.
    pub async fn fetch_diagnoses(&self, data: &AnamnesisData) -> Result<DiagnosisResponse, GeminiError> {
        let request = GenerateRequest::text(
            prompts::diagnoses(data),
            GenerationConfig::with_temperature(0.2).schema(schema::diagnosis()),
        );
        self.generate_json("fetch_diagnoses", request).await
    }

    pub async fn fetch_diagnosis_details(
        &self,
        data: &AnamnesisData,
        diagnosis: &Diagnosis,
    ) -> Result<DiagnosisDetail, GeminiError> {
        let request = GenerateRequest::text(
            prompts::diagnosis_details(data, &diagnosis.name),
            GenerationConfig::with_temperature(0.3).schema(schema::diagnosis_detail()),
        );
        self.generate_json("fetch_diagnosis_details", request).await
    }

    /// Fold checklist answers and the conducted plan into the anamnesis.
    ///
    /// Never fails: on any error the current anamnesis is returned unchanged
    /// so no typed data is lost. A training answer key is carried over.
    pub async fn integrate_feedback(&self, current: &AnamnesisData, feedback: &RetroFeedback) -> AnamnesisData {
        match self.try_integrate_feedback(current, feedback).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(error = %e, "feedback integration failed, keeping the current anamnesis");
                current.clone()
            }
        }
    }

    async fn try_integrate_feedback(
        &self,
        current: &AnamnesisData,
        feedback: &RetroFeedback,
    ) -> Result<AnamnesisData, GeminiError> {
        let current_json = serde_json::to_string_pretty(&current.without_answer_key())?;
        let request = GenerateRequest::text(
            prompts::integrate_feedback(&current_json, feedback),
            GenerationConfig::with_temperature(0.1).schema(schema::anamnesis()),
        );
        let updated: AnamnesisData = self.generate_json("integrate_feedback", request).await?;
        Ok(AnamnesisData {
            correct_diagnosis: current.correct_diagnosis.clone(),
            diagnosis_rationale: current.diagnosis_rationale.clone(),
            hidden_physical_exam: current.hidden_physical_exam.clone(),
            hidden_lab_results: current.hidden_lab_results.clone(),
            ..updated.clean()
        })
    }

    // ── Training mode ────────────────────────────────────────────────────────

    /// Generate a simulated case with a hidden answer key.
    ///
    /// The exam results, diagnostic hypotheses and initial plan are always
    /// blank: the student fills them in.
    pub async fn generate_test_case(
        &self,
        difficulty: Difficulty,
        specialty: Specialty,
    ) -> Result<AnamnesisData, GeminiError> {
        let config = GenerationConfig {
            temperature: Some(0.95),
            top_p: Some(0.95),
            top_k: Some(64),
            seed: Some(rand::thread_rng().gen_range(0..1_000_000)),
            response_schema: Some(schema::training_case()),
        };
        let request = GenerateRequest::text(prompts::training_case(difficulty, specialty), config);

        let mut case: AnamnesisData = self.generate_json("generate_test_case", request).await?;
        if !case.is_training_case() {
            return Err(GeminiError::SchemaViolation(
                "generated case has no diagnosticoCorreto".to_string(),
            ));
        }
        case.exam_results.clear();
        case.diagnostic_hypotheses.clear();
        case.initial_plan.clear();

        info!(%difficulty, %specialty, "training case generated");
        Ok(case.clean())
    }

    /// Answer one student request from the case's hidden findings.
    pub async fn fetch_investigation_result(
        &self,
        student_request: &str,
        hidden_physical_exam: &str,
        hidden_lab_results: &str,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest::text(
            prompts::investigation(student_request, hidden_physical_exam, hidden_lab_results),
            GenerationConfig::with_temperature(0.1),
        );
        self.generate_text("fetch_investigation_result", request).await
    }

    pub async fn evaluate_student_performance(
        &self,
        case: &AnamnesisData,
        hypotheses: &StudentHypotheses,
        log: &InvestigationLog,
        plan: &StudentPlan,
    ) -> Result<EvaluationResult, GeminiError> {
        let request = GenerateRequest::text(
            prompts::evaluation(case, hypotheses, log, plan),
            GenerationConfig::with_temperature(0.4).schema(schema::evaluation()),
        );
        self.generate_json("evaluate_student_performance", request).await
    }

    // ── Import ───────────────────────────────────────────────────────────────

    /// Structure free-form anamnesis text.
    pub async fn parse_anamnesis_text(&self, text: &str) -> Result<AnamnesisData, GeminiError> {
        let request = GenerateRequest::text(
            prompts::parse_anamnesis(text),
            GenerationConfig::with_temperature(0.0).schema(schema::anamnesis()),
        );
        let data: AnamnesisData = self.generate_json("parse_anamnesis_text", request).await?;
        Ok(data.clean())
    }

    /// Transcribe a recorded interview and structure it.
    pub async fn transcribe_anamnesis_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<AnamnesisData, GeminiError> {
        let request = GenerateRequest {
            parts: vec![
                Part::InlineData {
                    mime_type: mime_type.to_string(),
                    data: STANDARD.encode(audio),
                },
                Part::Text(prompts::TRANSCRIBE_AUDIO.to_string()),
            ],
            config: GenerationConfig::with_temperature(0.1).schema(schema::anamnesis()),
            google_search: false,
        };
        info!(mime_type, bytes = audio.len(), "transcribing audio anamnesis");
        let data: AnamnesisData = self.generate_json("transcribe_anamnesis_audio", request).await?;
        Ok(data.clean())
    }

    /// Plain text of a PDF document.
    pub async fn extract_document_text(&self, pdf: &[u8]) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            parts: vec![
                Part::InlineData {
                    mime_type: PDF_MIME_TYPE.to_string(),
                    data: STANDARD.encode(pdf),
                },
                Part::Text(prompts::EXTRACT_DOCUMENT.to_string()),
            ],
            config: GenerationConfig::with_temperature(0.0),
            google_search: false,
        };
        info!(bytes = pdf.len(), "extracting text from document");
        let text = self.generate_text("extract_document_text", request).await?;
        info!(text_len = text.len(), "document text extraction complete");
        Ok(text)
    }

    /// Condense a raw lab report into one line of relevant results.
    pub async fn summarize_exam_results(&self, text: &str) -> Result<String, GeminiError> {
        let request = GenerateRequest::text(
            prompts::summarize_exams(text),
            GenerationConfig::with_temperature(0.0),
        );
        self.generate_text("summarize_exam_results", request).await
    }

    // ── Auxiliary views ──────────────────────────────────────────────────────

    /// Chronological events of the HDA.
    ///
    /// Best effort: short input returns an empty timeline without calling the
    /// model, and failures are logged and yield an empty timeline.
    pub async fn fetch_timeline(&self, hda: &str) -> Vec<TimelineEvent> {
        if hda.trim().chars().count() < MIN_TIMELINE_HDA_LEN {
            return Vec::new();
        }

        #[derive(Deserialize)]
        struct TimelineEnvelope {
            #[serde(default)]
            timeline: Vec<TimelineEvent>,
        }

        let request = GenerateRequest::text(
            prompts::timeline(hda),
            GenerationConfig::with_temperature(0.1).schema(schema::timeline()),
        );
        match self.generate_json::<TimelineEnvelope>("fetch_timeline", request).await {
            Ok(envelope) => envelope.timeline,
            Err(e) => {
                warn!(error = %e, "timeline extraction failed");
                Vec::new()
            }
        }
    }

    /// Literature summary for a diagnosis, grounded with Google Search.
    ///
    /// Search grounding cannot be combined with a response schema, so the
    /// JSON is parsed leniently. Unparseable text is returned as the disease
    /// summary with fixed placeholders for the other sections.
    pub async fn fetch_academic_publications(
        &self,
        diagnosis: &str,
    ) -> Result<AcademicSearchResult, GeminiError> {
        let request = GenerateRequest {
            parts: vec![Part::Text(prompts::academic_publications(diagnosis))],
            config: GenerationConfig::with_temperature(0.2),
            google_search: true,
        };
        let response = self.generate("fetch_academic_publications", request).await?;

        let mut result = match serde_json::from_str::<AcademicSearchResult>(strip_json_fence(&response.text)) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, diagnosis, "academic search answer is not JSON, using raw text");
                AcademicSearchResult {
                    disease_summary: format!(
                        "A IA não retornou um formato JSON válido. O conteúdo recebido foi:\n\n{}",
                        response.text.trim()
                    ),
                    treatment_guidelines: ACADEMIC_FALLBACK_GUIDELINES.to_string(),
                    recent_findings: ACADEMIC_FALLBACK_FINDINGS.to_string(),
                    sources: Vec::new(),
                }
            }
        };
        result.sources = response.sources;
        Ok(result)
    }

    /// One-paragraph summary suitable for an electronic health record note.
    pub async fn generate_prontuary_summary(&self, anamnesis_text: &str) -> Result<String, GeminiError> {
        let request = GenerateRequest::text(
            prompts::prontuary_summary(anamnesis_text),
            GenerationConfig::with_temperature(0.3),
        );
        self.generate_text("generate_prontuary_summary", request).await
    }
}

/// Remove a surrounding markdown code fence (```` ```json ```` or bare
/// ```` ``` ````) if present.
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json<T: DeserializeOwned>(operation: &str, text: &str) -> Result<T, GeminiError> {
    serde_json::from_str(strip_json_fence(text)).map_err(|e| {
        GeminiError::SchemaViolation(format!("{operation}: {e}. Response: {}", text.trim()))
    })
}
