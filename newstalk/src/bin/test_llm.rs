use common::Config;
use newstalk::chat::{self, ConversationTurn};
use newstalk::ingestion::NewsItem;
use newstalk::llm::gemini::GeminiProvider;
use newstalk::llm::summarizer;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::default();

    let api_key = std::env::var(&config.llm.api_key_env)
        .expect("Set GEMINI_API_KEY environment variable");

    println!("\n{}", "=".repeat(60));
    println!("Testing LLM provider");
    println!("Base URL: {}", config.llm.api_url);
    println!("Model: {}", config.llm.model);
    println!("{}", "=".repeat(60));

    let provider = GeminiProvider::new(&config.llm.api_url, &api_key, &config.llm.model)
        .with_defaults(
            config.llm.timeout_seconds,
            config.llm.max_output_tokens,
            config.llm.temperature,
        );

    let articles = vec![
        NewsItem {
            title: "국내 연구진, 한국어 특화 언어모델 공개".to_string(),
            link: "https://news.example.com/articles/1".to_string(),
            pub_date: None,
            source: Some("예시일보".to_string()),
            snippet: Some("국내 연구진이 한국어 이해 능력을 높인 언어모델을 공개했다.".to_string()),
        },
        NewsItem {
            title: "정부, 인공지능 산업 지원 방안 발표".to_string(),
            link: "https://news.example.com/articles/2".to_string(),
            pub_date: None,
            source: None,
            snippet: Some("정부가 인공지능 산업 육성을 위한 지원 방안을 내놓았다.".to_string()),
        },
    ];

    println!("\n[Test 1] Summarizing {} articles...", articles.len());
    let summary = match summarizer::summarize(&provider, "인공지능", &articles).await {
        Ok(summary) => {
            println!("✓ Success!");
            println!("{}", summary);
            summary
        }
        Err(e) => {
            eprintln!("✗ Failed: {}", e);
            return;
        }
    };

    println!("\n[Test 2] Asking a grounded follow-up question...");
    let history: Vec<ConversationTurn> = Vec::new();
    match chat::respond(
        &provider,
        &summary,
        Some("인공지능"),
        "이 기사는 무엇에 관한 것인가요?",
        &history,
        config.chat.history_window,
    )
    .await
    {
        Ok(reply) => {
            println!("✓ Reply:");
            println!("{}", reply);
        }
        Err(e) => {
            eprintln!("✗ Failed: {}", e);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("Tests completed");
    println!("{}", "=".repeat(60));
}
