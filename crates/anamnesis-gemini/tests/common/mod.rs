//! Scripted stand-in for the Gemini service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anamnesis_core::models::token_count::TokenCount;
use anamnesis_gemini::client::{GenerateRequest, GenerateResponse, GenerativeModel};
use anamnesis_gemini::error::GeminiError;

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<GenerateResponse, GeminiError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(GenerateResponse {
            text: text.to_string(),
            sources: Vec::new(),
            usage: TokenCount { input: 10, output: 5 },
        }))
    }

    pub fn reply_with(self, response: GenerateResponse) -> Self {
        self.push(Ok(response))
    }

    pub fn fail(self, error: GeminiError) -> Self {
        self.push(Err(error))
    }

    fn push(self, item: Result<GenerateResponse, GeminiError>) -> Self {
        self.responses.lock().unwrap().push_back(item);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> GenerateRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeminiError::ResponseParse("script exhausted".to_string())))
    }
}

pub fn rate_limited() -> GeminiError {
    GeminiError::Api {
        status: 429,
        code: "RESOURCE_EXHAUSTED".to_string(),
        message: "Quota exceeded".to_string(),
    }
}
