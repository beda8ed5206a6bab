//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! [`GenerativeModel`] is the seam between the clinical operations and the
//! network: [`GeminiClient`] implements it over reqwest, and tests substitute
//! scripted fakes.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anamnesis_core::models::academic::{GroundingChunk, WebSource};
use anamnesis_core::models::token_count::TokenCount;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::GeminiError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const API_KEY_HEADER: &str = "x-goog-api-key";

// ── Request / response types ─────────────────────────────────────────────────

/// One piece of prompt content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Binary content (audio, PDF) sent inline as base64.
    InlineData { mime_type: String, data: String },
}

/// Sampling parameters for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub seed: Option<u32>,
    /// When set, the model is asked for `application/json` matching this
    /// schema.
    pub response_schema: Option<Value>,
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    pub config: GenerationConfig,
    /// Enable the Google Search grounding tool.
    pub google_search: bool,
}

impl GenerateRequest {
    /// A single text prompt.
    pub fn text(prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            config,
            google_search: false,
        }
    }

    /// The concatenated text parts, for logging and test assertions.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Text of the first candidate, all parts concatenated.
    pub text: String,
    /// Web sources the answer was grounded on, when search was enabled.
    pub sources: Vec<GroundingChunk>,
    pub usage: TokenCount,
}

/// Anything that can answer a [`GenerateRequest`].
pub trait GenerativeModel: Send + Sync {
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, GeminiError>> + Send;
}

// ── Client ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, GeminiError> {
        let api_key = settings.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(GeminiError::Config("API key is empty".to_string()));
        }
        if settings.model.trim().is_empty() {
            return Err(GeminiError::Config("model name is empty".to_string()));
        }

        let base = validate_base_url(&settings.base_url)?;
        let endpoint = Url::parse(&format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            settings.model
        ))
        .map_err(|e| GeminiError::Config(format!("invalid endpoint: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            model: settings.model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        let body = build_request_body(request);
        debug!(model = %self.model, parts = request.parts.len(), "POST generateContent");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &text));
        }
        parse_generate_response(&text)
    }
}

/// Accept only plain http(s) base URLs without embedded credentials.
pub fn validate_base_url(raw: &str) -> Result<Url, GeminiError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| GeminiError::Config(format!("invalid base URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GeminiError::Config(format!(
            "unsupported URL scheme {:?}",
            url.scheme()
        )));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(GeminiError::Config(
            "base URL must not contain credentials".to_string(),
        ));
    }
    if url.host_str().is_none() {
        return Err(GeminiError::Config("base URL has no host".to_string()));
    }
    Ok(url)
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: [WireContent<'a>; 1],
    generation_config: WireGenerationConfig<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text { text: &'a str },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: WireInlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    google_search: EmptyObject,
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

/// The JSON body sent to `generateContent` for `request`.
pub fn build_request_body(request: &GenerateRequest) -> Value {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::Text { text },
            Part::InlineData { mime_type, data } => WirePart::Inline {
                inline_data: WireInlineData { mime_type, data },
            },
        })
        .collect();

    let config = &request.config;
    let wire = WireRequest {
        contents: [WireContent {
            role: "user",
            parts,
        }],
        generation_config: WireGenerationConfig {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            seed: config.seed,
            response_mime_type: config
                .response_schema
                .as_ref()
                .map(|_| "application/json"),
            response_schema: config.response_schema.as_ref(),
        },
        tools: if request.google_search {
            vec![WireTool {
                google_search: EmptyObject {},
            }]
        } else {
            Vec::new()
        },
    };

    // Plain data with string keys; serialization cannot fail.
    serde_json::to_value(wire).unwrap_or(Value::Null)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireCandidateContent>,
    grounding_metadata: Option<WireGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
struct WireResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct WireGroundingChunk {
    web: Option<WireWeb>,
}

#[derive(Debug, Deserialize)]
struct WireWeb {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    block_reason: Option<String>,
}

/// Decode a successful `generateContent` response body.
pub fn parse_generate_response(body: &str) -> Result<GenerateResponse, GeminiError> {
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|e| GeminiError::ResponseParse(format!("invalid response body: {e}")))?;

    let usage = wire
        .usage_metadata
        .map(|u| TokenCount {
            input: u.prompt_token_count,
            output: u.candidates_token_count,
        })
        .unwrap_or_default();

    let Some(candidate) = wire.candidates.into_iter().next() else {
        let reason = wire
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "unknown".to_string());
        return Err(GeminiError::ResponseParse(format!(
            "no candidates in response (block reason: {reason})"
        )));
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .map(|g| g.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| {
            let web = chunk.web?;
            let uri = web.uri.filter(|u| !u.is_empty())?;
            let title = web.title.filter(|t| !t.is_empty()).unwrap_or_else(|| uri.clone());
            Some(GroundingChunk {
                web: WebSource { uri, title },
            })
        })
        .collect();

    Ok(GenerateResponse {
        text,
        sources,
        usage,
    })
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireErrorBody,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a non-success HTTP response to [`GeminiError::Api`].
///
/// Bodies that are not the documented error envelope are kept verbatim as the
/// message.
pub fn parse_error_body(status: u16, body: &str) -> GeminiError {
    match serde_json::from_str::<WireErrorEnvelope>(body) {
        Ok(envelope) => GeminiError::Api {
            status,
            code: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => GeminiError::Api {
            status,
            code: String::new(),
            message: body.trim().to_string(),
        },
    }
}
