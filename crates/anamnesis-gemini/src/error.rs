use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the service. `code` is the service status
    /// string such as `RESOURCE_EXHAUSTED`.
    #[error("Gemini API error (HTTP {status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("response did not conform to expected schema: {0}")]
    SchemaViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("client configuration error: {0}")]
    Config(String),
}

impl GeminiError {
    /// Whether this error is a transient rate-limit condition.
    pub fn is_rate_limited(&self) -> bool {
        crate::retry::is_rate_limit_error(self)
    }
}
