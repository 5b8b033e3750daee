use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::llm::{extract_text, LlmProvider, LlmRequest};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering a transcript into the prompt.
    fn label(self) -> &'static str {
        match self {
            Role::User => "사용자",
            Role::Assistant => "어시스턴트",
        }
    }
}

/// One role-tagged message within a conversation. History is owned by the
/// caller and resent on every request; the server never stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

/// Render the grounded chat prompt.
///
/// At most the last `history_window` turns are embedded, in chronological
/// order. The caller's own history is never modified; only the rendered
/// transcript is bounded.
pub fn build_chat_prompt(
    summary: &str,
    message: &str,
    history: &[ConversationTurn],
    history_window: usize,
) -> String {
    let mut conversation_text = String::new();
    if !history.is_empty() {
        let start = history.len().saturating_sub(history_window);
        let rendered = history[start..]
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");
        conversation_text = format!("\n\n[이전 대화]\n{}\n\n", rendered);
    }

    format!(
        "당신은 뉴스 요약을 바탕으로 답변하는 친절한 뉴스 어시스턴트입니다. \
         아래 [뉴스 요약]만을 근거로 답변하세요. 요약에 없는 내용은 \
         \"해당 뉴스에서는 다루지 않았습니다\"라고 하세요. 한국어로만 답변하세요.\n\n\
         [뉴스 요약]\n{}\n{}사용자: {}\n\n어시스턴트:",
        summary,
        conversation_text,
        message.trim()
    )
}

/// Answer a question grounded in a previously produced summary.
///
/// The summary must be non-empty (summarization runs first) and the
/// message non-blank; both are validated before any provider call.
pub async fn respond(
    provider: &dyn LlmProvider,
    summary: &str,
    keyword: Option<&str>,
    message: &str,
    history: &[ConversationTurn],
    history_window: usize,
) -> Result<String, ApiError> {
    if summary.trim().is_empty() {
        return Err(ApiError::Validation(
            "요약본이 없습니다. 먼저 요약을 실행해주세요.".to_string(),
        ));
    }
    if message.trim().is_empty() {
        return Err(ApiError::Validation("질문을 입력해주세요.".to_string()));
    }

    debug!(
        keyword = keyword.unwrap_or(""),
        history = history.len(),
        "chat turn"
    );

    let prompt = build_chat_prompt(summary, message, history, history_window);
    let response = provider.generate(LlmRequest::from_prompt(prompt)).await?;

    let reply = extract_text(&response);
    if reply.is_empty() {
        return Err(ApiError::Extraction);
    }

    Ok(reply)
}
