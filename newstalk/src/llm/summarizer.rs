// Summarizer module
use tracing::info;

use super::{extract_text, LlmProvider, LlmRequest};
use crate::error::ApiError;
use crate::ingestion::NewsItem;

/// Snippets are truncated harder for the prompt than for storage.
pub const PROMPT_SNIPPET_CHARS: usize = 150;

/// Render the summarization prompt for a keyword and its articles.
/// Pure function of its inputs; only the provider call is non-deterministic.
pub fn build_summary_prompt(keyword: &str, articles: &[NewsItem]) -> String {
    let news_text = articles
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let snippet: String = item
                .snippet
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(PROMPT_SNIPPET_CHARS)
                .collect();
            format!("{}. {}\n   {}...", i + 1, item.title, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "당신은 뉴스 요약 전문가입니다. 아래는 \"{}\" 키워드로 수집한 뉴스 {}건입니다.\n\
         한국어로 간결하고 읽기 쉽게 전체 요약을 작성해주세요. (3~5문단, 핵심만)\n\n\
         뉴스 목록:\n{}",
        keyword,
        articles.len(),
        news_text
    )
}

/// Produce a grounded multi-paragraph summary of the article set.
///
/// The article list must be non-empty; validation happens before any
/// provider call.
pub async fn summarize(
    provider: &dyn LlmProvider,
    keyword: &str,
    articles: &[NewsItem],
) -> Result<String, ApiError> {
    if articles.is_empty() {
        return Err(ApiError::Validation(
            "키워드와 뉴스 목록이 필요합니다.".to_string(),
        ));
    }

    let prompt = build_summary_prompt(keyword, articles);
    let response = provider.generate(LlmRequest::from_prompt(prompt)).await?;

    let summary = extract_text(&response);
    if summary.is_empty() {
        return Err(ApiError::Extraction);
    }

    info!(
        keyword,
        articles = articles.len(),
        chars = summary.chars().count(),
        "summary generated"
    );
    Ok(summary)
}
