//! A stand-in for the Gemini service that answers by prompt content, so
//! concurrent calls get the right reply regardless of completion order.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::token_count::TokenCount;
use anamnesis_gemini::assistant::Assistant;
use anamnesis_gemini::client::{GenerateRequest, GenerateResponse, GenerativeModel};
use anamnesis_gemini::error::GeminiError;
use anamnesis_gemini::retry::RetryPolicy;

use anamnesis_cli::session::Session;

pub const DIAGNOSES: &str = "duas listas separadas";
pub const TIMELINE: &str = "eventos chave em ordem cronológica";
pub const INVESTIGATION: &str = "simulador médico realista";
pub const TRAINING: &str = "criando um caso clínico";
pub const EVALUATION: &str = "preceptor de medicina";
pub const PARSE: &str = "processamento de dados médicos";
pub const SUMMARIZE_EXAMS: &str = "laudos de exames";
pub const FEEDBACK: &str = "integrar novas informações";
pub const CHART_SUMMARY: &str = "nota de evolução";

pub fn details_for(name: &str) -> String {
    format!("O diagnóstico selecionado é: \"{name}\"")
}

struct Route {
    needle: String,
    delay: Duration,
    replies: VecDeque<Result<String, GeminiError>>,
}

#[derive(Default)]
pub struct RoutedModel {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl RoutedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, needle: &str, text: &str) -> Self {
        self.push(needle, Duration::ZERO, Ok(text.to_string()))
    }

    pub fn on_delayed(self, needle: &str, delay: Duration, text: &str) -> Self {
        self.push(needle, delay, Ok(text.to_string()))
    }

    pub fn fail_on(self, needle: &str, error: GeminiError) -> Self {
        self.push(needle, Duration::ZERO, Err(error))
    }

    fn push(self, needle: &str, delay: Duration, reply: Result<String, GeminiError>) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| r.needle == needle) {
                Some(route) => route.replies.push_back(reply),
                None => routes.push(Route {
                    needle: needle.to_string(),
                    delay,
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.prompt_text().contains(needle))
            .count()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerativeModel for RoutedModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        self.requests.lock().unwrap().push(request.clone());
        let prompt = request.prompt_text();

        let (delay, reply) = {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| prompt.contains(&r.needle)) {
                Some(route) => (route.delay, route.replies.pop_front()),
                None => (Duration::ZERO, None),
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let text = reply.unwrap_or_else(|| {
            Err(GeminiError::ResponseParse(format!(
                "no scripted reply for prompt starting {:?}",
                prompt.chars().take(60).collect::<String>()
            )))
        })?;
        Ok(GenerateResponse {
            text,
            sources: Vec::new(),
            usage: TokenCount { input: 10, output: 5 },
        })
    }
}

pub fn session(model: RoutedModel) -> Session<RoutedModel> {
    Session::new(Assistant::new(model).with_retry_policy(RetryPolicy::immediate(0)))
}

pub fn chest_pain() -> AnamnesisData {
    AnamnesisData {
        age: "58".to_string(),
        sex: "Masculino".to_string(),
        chief_complaint: "Dor torácica há 2 horas".to_string(),
        hpi: "Dor em aperto retroesternal iniciada há 2 horas, irradiando para o braço esquerdo, com sudorese."
            .to_string(),
        ..AnamnesisData::default()
    }
}

pub const DIAGNOSES_JSON: &str = r#"{
  "diagnosticosProvaveis": [
    {"diagnostico": "Infarto agudo do miocárdio", "probabilidade": 70, "justificativa": "Dor típica"},
    {"diagnostico": "Angina instável", "probabilidade": 20, "justificativa": "Dor em repouso"}
  ],
  "diagnosticosDiferenciais": [
    {"diagnostico": "Dissecção de aorta", "probabilidade": 5, "justificativa": "Grave"},
    {"diagnostico": "infarto agudo do miocárdio", "probabilidade": 40, "justificativa": "Duplicado"}
  ]
}"#;

pub const TIMELINE_JSON: &str =
    r#"{"timeline": [{"time": "Há 2 horas", "event": "Início da dor torácica"}]}"#;

pub const TRAINING_CASE_JSON: &str = r#"{
  "idade": "34 anos",
  "sexo": "Feminino",
  "queixaPrincipal": "Falta de ar há 3 dias",
  "hda": "Dispneia progressiva há 3 dias, pior ao deitar, com tosse seca.",
  "resultadosExames": "deveria vir vazio",
  "diagnosticoCorreto": "Insuficiência cardíaca descompensada",
  "resumoDiagnostico": "Ortopneia e congestão",
  "hiddenPhysicalExam": "Estertores bibasais, edema de MMII",
  "hiddenLabResults": "BNP 1200 pg/mL"
}"#;

pub const EVALUATION_JSON: &str = r#"{
  "score": 82,
  "scoreJustificativa": "Boa investigação",
  "pontosPositivos": "Solicitou BNP",
  "pontosMelhorar": "Esqueceu ecocardiograma",
  "raciocinioCorreto": "Ortopneia sugere IC",
  "analiseDaConduta": "Prescrição adequada"
}"#;
