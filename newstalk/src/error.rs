use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// Error taxonomy of the HTTP API. Every failure a route can produce maps
/// to exactly one variant, one status code and one user-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or blank request input; never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Required configuration absent (the API key env var named by the
    /// payload); the request never reaches the network.
    #[error("configuration error: env var '{0}' not set")]
    Config(String),

    /// Feed retrieval or parse failure.
    #[error("news collection failed: {0}")]
    Collector(anyhow::Error),

    /// Text generation provider failure.
    #[error("provider call failed: {0}")]
    Upstream(#[from] LlmError),

    /// Provider succeeded but no text could be extracted.
    #[error("provider returned an empty response")]
    Extraction,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Config(_) => Status::InternalServerError,
            ApiError::Collector(_) => Status::InternalServerError,
            ApiError::Upstream(LlmError::RateLimited { .. }) => Status::TooManyRequests,
            ApiError::Upstream(_) => Status::InternalServerError,
            ApiError::Extraction => Status::InternalServerError,
        }
    }

    /// Localized message returned to the end user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Config(_) => {
                "GEMINI_API_KEY가 설정되지 않았습니다. 환경 변수를 확인하세요.".to_string()
            }
            ApiError::Collector(_) => "뉴스를 가져오는 중 오류가 발생했습니다.".to_string(),
            ApiError::Upstream(LlmError::Unauthorized { .. }) => {
                "API 키가 유효하지 않습니다. GEMINI_API_KEY를 확인하세요.".to_string()
            }
            ApiError::Upstream(LlmError::RateLimited { .. }) => {
                "요청 한도를 초과했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            ApiError::Upstream(_) => {
                "답변 생성 중 오류가 발생했습니다. 서버 로그를 확인하세요.".to_string()
            }
            ApiError::Extraction => {
                "답변을 생성하지 못했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            tracing::error!(status = status.code, error = %self, "request failed");
        } else {
            tracing::warn!(status = status.code, error = %self, "request rejected");
        }
        let body = Json(ErrorBody {
            error: self.user_message(),
        });
        (status, body).respond_to(req)
    }
}
