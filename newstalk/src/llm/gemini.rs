use serde::Serialize;
use std::time::Duration;

use super::{LlmError, LlmProvider, LlmRequest, ProviderResponse};

/// Remote provider for the Gemini generateContent HTTP API
pub struct GeminiProvider {
    api_url: String,
    api_key: String,
    model: String,
    default_timeout: Duration,
    default_max_tokens: u32,
    default_temperature: f32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 1024,
            default_temperature: 0.7,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(mut self, timeout_secs: u64, max_tokens: u32, temperature: f32) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, request: LlmRequest) -> Result<ProviderResponse, LlmError> {
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let req_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens.unwrap_or(self.default_max_tokens),
                temperature: request.temperature.unwrap_or(self.default_temperature),
            },
        };

        let url = self.endpoint();

        // One timeout bounds the whole round trip: connect, headers and body.
        tokio::time::timeout(timeout, async {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&req_body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::from_status(status.as_u16(), body));
            }

            response
                .json::<ProviderResponse>()
                .await
                .map_err(|e| LlmError::Decode(e.to_string()))
        })
        .await
        .map_err(|_| LlmError::Timeout(timeout))?
    }
}

// Gemini generateContent request structures
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}
