use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::serde::json::{self, Json};
use rocket::{get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};

use common::Config;

use crate::chat::{self as chat_svc, ConversationTurn};
use crate::error::ApiError;
use crate::ingestion::{self, NewsItem};
use crate::llm::{summarizer, LlmProvider};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    /// None when the API key env var is unset; summarize and chat then
    /// fail with a configuration error before any network I/O.
    pub llm_provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    fn provider(&self) -> Result<Arc<dyn LlmProvider>, ApiError> {
        self.llm_provider
            .clone()
            .ok_or_else(|| ApiError::Config(self.config.llm.api_key_env.clone()))
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    model: String,
    llm_configured: bool,
}

#[derive(Serialize)]
struct NewsResponse {
    keyword: String,
    news: Vec<NewsItem>,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    keyword: Option<String>,
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    summary: Option<String>,
    keyword: Option<String>,
    message: Option<String>,
    #[serde(default)]
    history: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning simple JSON with uptime and basic config info.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: (now - state.started_at).num_seconds(),
        model: state.config.llm.model.clone(),
        llm_configured: state.llm_provider.is_some(),
    })
}

/// Collect recent news for a keyword.
#[get("/news?<keyword>")]
async fn collect_news(
    state: &State<AppState>,
    keyword: Option<String>,
) -> Result<Json<NewsResponse>, ApiError> {
    let keyword = keyword.unwrap_or_default();
    let news = ingestion::fetch_news(&state.config.feed, &keyword).await?;
    Ok(Json(NewsResponse {
        keyword: keyword.trim().to_string(),
        news,
    }))
}

/// Summarize a collected article set.
#[post("/summarize", data = "<body>")]
async fn summarize(
    state: &State<AppState>,
    body: Result<Json<SummarizeRequest>, json::Error<'_>>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let provider = state.provider()?;
    let body = body
        .map_err(|_| ApiError::Validation("요청 본문이 올바른 JSON이 아닙니다.".to_string()))?
        .into_inner();

    let keyword = body.keyword.as_deref().map(str::trim).unwrap_or("");
    if keyword.is_empty() || body.news.is_empty() {
        return Err(ApiError::Validation(
            "키워드와 뉴스 목록이 필요합니다.".to_string(),
        ));
    }

    let summary = summarizer::summarize(provider.as_ref(), keyword, &body.news).await?;
    Ok(Json(SummarizeResponse { summary }))
}

/// Answer a question grounded in a previously produced summary.
#[post("/chat", data = "<body>")]
async fn chat(
    state: &State<AppState>,
    body: Result<Json<ChatRequest>, json::Error<'_>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let provider = state.provider()?;
    let body = body
        .map_err(|_| ApiError::Validation("요청 본문이 올바른 JSON이 아닙니다.".to_string()))?
        .into_inner();

    let reply = chat_svc::respond(
        provider.as_ref(),
        body.summary.as_deref().unwrap_or(""),
        body.keyword.as_deref(),
        body.message.as_deref().unwrap_or(""),
        &body.history,
        state.config.chat.history_window,
    )
    .await?;

    Ok(Json(ChatResponse { reply }))
}

/// Build the Rocket instance with all routes mounted. Split from
/// `launch_rocket` so tests can drive it with a local client.
pub fn build_rocket(
    config: Arc<Config>,
    llm_provider: Option<Arc<dyn LlmProvider>>,
) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.bind.clone()))
        .merge(("port", config.server.port));

    let state = AppState {
        started_at: Utc::now(),
        config,
        llm_provider,
    };

    rocket::custom(figment).manage(state).mount(
        "/",
        routes![health, status, collect_news, summarize, chat],
    )
}

/// Launch the Rocket server (blocking until Rocket shuts down).
pub async fn launch_rocket(
    config: Arc<Config>,
    llm_provider: Option<Arc<dyn LlmProvider>>,
) -> Result<()> {
    tracing::info!("Starting Rocket HTTP server");
    build_rocket(config, llm_provider)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
