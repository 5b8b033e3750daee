use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Core trait for text generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a single prompt through the provider
    async fn generate(&self, request: LlmRequest) -> Result<ProviderResponse, LlmError>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// A request carrying only a prompt; limits fall back to the
    /// provider's defaults.
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            prompt,
            max_output_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// The provider result decodes into one of two shapes: a direct text
/// field, or a list of candidates with nested content parts. Anything
/// else is kept opaque and extracts to an empty string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProviderResponse {
    Direct { text: String },
    Candidates { candidates: Vec<Candidate> },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Normalize a provider response into plain text.
///
/// The direct text field wins; otherwise the first candidate's first
/// content part is used. Returns an empty string when neither is present;
/// callers decide whether that is an error.
pub fn extract_text(response: &ProviderResponse) -> String {
    let text = match response {
        ProviderResponse::Direct { text } => text.as_str(),
        ProviderResponse::Candidates { candidates } => candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_deref())
            .unwrap_or(""),
        ProviderResponse::Other(_) => "",
    };
    text.trim().to_string()
}

/// Typed provider failure. Classification happens on the HTTP status of
/// the provider response, never on message text.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Credentials rejected (HTTP 401/403).
    #[error("provider rejected credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Quota or rate limit exhausted (HTTP 429).
    #[error("provider rate limit exceeded ({status}): {message}")]
    RateLimited { status: u16, message: String },

    /// Any other non-success status.
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The call did not complete within the configured timeout.
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure before a status was received.
    #[error("provider HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Map a non-success HTTP status from the provider to an error kind.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => LlmError::Unauthorized { status, message },
            429 => LlmError::RateLimited { status, message },
            _ => LlmError::Api { status, message },
        }
    }
}

pub mod gemini;
pub mod summarizer;
