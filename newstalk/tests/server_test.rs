use std::sync::Arc;

use common::Config;
use mockito::{Matcher, Server, ServerGuard};
use newstalk::llm::gemini::GeminiProvider;
use newstalk::llm::LlmProvider;
use newstalk::server::build_rocket;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

// "인공지능" percent-encoded for request URIs
const ENCODED_KEYWORD: &str = "%EC%9D%B8%EA%B3%B5%EC%A7%80%EB%8A%A5";

fn test_config(feed_endpoint: &str) -> Config {
    let mut config = Config::default();
    config.feed.endpoint = feed_endpoint.to_string();
    config
}

fn provider_for(server: &ServerGuard) -> Arc<dyn LlmProvider> {
    Arc::new(GeminiProvider::new(
        server.url(),
        "test-key",
        "gemini-2.5-flash",
    ))
}

async fn client_with(config: Config, provider: Option<Arc<dyn LlmProvider>>) -> Client {
    Client::tracked(build_rocket(Arc::new(config), provider))
        .await
        .expect("valid rocket instance")
}

fn rss_feed(item_count: usize) -> String {
    let mut items = String::new();
    for i in 1..=item_count {
        items.push_str(&format!(
            "<item>\
             <title>인공지능 관련 기사 {i}</title>\
             <link>https://news.example.com/articles/{i}</link>\
             <guid isPermaLink=\"false\">guid-{i}</guid>\
             <pubDate>Mon, 06 Jan 2025 09:00:00 GMT</pubDate>\
             <description>&lt;a href=\"https://news.example.com\"&gt;인공지능&lt;/a&gt; 기술 동향 {i}</description>\
             </item>"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>\"인공지능\" - 뉴스 검색</title>{items}</channel></rss>"
    )
}

fn candidates_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[rocket::async_test]
async fn status_endpoint_reports_configuration() {
    let client = client_with(test_config("http://127.0.0.1:1/rss"), None).await;

    let response = client.get("/api/v1/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_configured"], false);
    assert_eq!(body["model"], "gemini-2.5-flash");
}

#[rocket::async_test]
async fn missing_keyword_is_rejected_without_network() {
    let mut feed = Server::new_async().await;
    let mock = feed
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_with(test_config(&feed.url()), None).await;

    for uri in ["/news", "/news?keyword=", "/news?keyword=%20%20"] {
        let response = client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["error"], "키워드를 입력해주세요.");
    }

    mock.assert_async().await;
}

#[rocket::async_test]
async fn collect_returns_normalized_items() {
    let mut feed = Server::new_async().await;
    let _mock = feed
        .mock("GET", Matcher::Any)
        .with_status(200)
        .with_body(rss_feed(3))
        .create_async()
        .await;

    let client = client_with(test_config(&feed.url()), None).await;

    // Surrounding whitespace in the keyword is trimmed before the query
    let response = client
        .get(format!("/news?keyword=%20{}%20", ENCODED_KEYWORD))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["keyword"], "인공지능");
    let news = body["news"].as_array().expect("news array");
    assert_eq!(news.len(), 3);
    assert_eq!(news[0]["title"], "인공지능 관련 기사 1");
    assert_eq!(news[0]["link"], "https://news.example.com/articles/1");
}

#[rocket::async_test]
async fn feed_failure_is_server_error() {
    let mut feed = Server::new_async().await;
    let _mock = feed
        .mock("GET", Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let client = client_with(test_config(&feed.url()), None).await;

    let response = client
        .get(format!("/news?keyword={ENCODED_KEYWORD}"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["error"], "뉴스를 가져오는 중 오류가 발생했습니다.");
}

#[rocket::async_test]
async fn summarize_without_api_key_is_config_error() {
    let client = client_with(test_config("http://127.0.0.1:1/rss"), None).await;

    let response = client
        .post("/summarize")
        .header(ContentType::JSON)
        .body(
            json!({
                "keyword": "인공지능",
                "news": [{"title": "기사", "link": "https://news.example.com/1"}]
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::InternalServerError);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(
        body["error"],
        "GEMINI_API_KEY가 설정되지 않았습니다. 환경 변수를 확인하세요."
    );
}

#[rocket::async_test]
async fn summarize_requires_keyword_and_news() {
    let gemini = Server::new_async().await;
    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let empty_news = json!({"keyword": "인공지능", "news": []}).to_string();
    let missing_keyword = json!({"news": [{"title": "기사", "link": "https://a.example"}]}).to_string();

    for body in [empty_news, missing_keyword] {
        let response = client
            .post("/summarize")
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["error"], "키워드와 뉴스 목록이 필요합니다.");
    }
}

#[rocket::async_test]
async fn malformed_chat_body_is_rejected() {
    let gemini = Server::new_async().await;
    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let response = client
        .post("/chat")
        .header(ContentType::JSON)
        .body("이것은 JSON이 아닙니다")
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["error"], "요청 본문이 올바른 JSON이 아닙니다.");
}

#[rocket::async_test]
async fn chat_before_summarization_is_rejected() {
    let gemini = Server::new_async().await;
    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    for body in [
        json!({"message": "질문입니다"}).to_string(),
        json!({"summary": "   ", "message": "질문입니다"}).to_string(),
    ] {
        let response = client
            .post("/chat")
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["error"], "요약본이 없습니다. 먼저 요약을 실행해주세요.");
    }
}

#[rocket::async_test]
async fn chat_requires_a_message() {
    let gemini = Server::new_async().await;
    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let response = client
        .post("/chat")
        .header(ContentType::JSON)
        .body(json!({"summary": "요약 내용", "message": "   "}).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["error"], "질문을 입력해주세요.");
}

#[rocket::async_test]
async fn provider_rate_limit_maps_to_429() {
    let mut gemini = Server::new_async().await;
    let mock = gemini
        .mock("POST", GENERATE_PATH)
        .with_status(429)
        .with_body(
            json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let response = client
        .post("/chat")
        .header(ContentType::JSON)
        .body(json!({"summary": "요약 내용", "message": "질문입니다"}).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::TooManyRequests);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(
        body["error"],
        "요청 한도를 초과했습니다. 잠시 후 다시 시도해주세요."
    );

    mock.assert_async().await;
}

#[rocket::async_test]
async fn provider_auth_failure_maps_to_500_with_credential_message() {
    let mut gemini = Server::new_async().await;
    let mock = gemini
        .mock("POST", GENERATE_PATH)
        .with_status(401)
        .with_body(
            json!({
                "error": {"code": 401, "message": "API key not valid.", "status": "UNAUTHENTICATED"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let response = client
        .post("/chat")
        .header(ContentType::JSON)
        .body(json!({"summary": "요약 내용", "message": "질문입니다"}).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::InternalServerError);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(
        body["error"],
        "API 키가 유효하지 않습니다. GEMINI_API_KEY를 확인하세요."
    );

    mock.assert_async().await;
}

#[rocket::async_test]
async fn empty_extraction_is_server_error() {
    let mut gemini = Server::new_async().await;
    let _mock = gemini
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(json!({"candidates": []}).to_string())
        .create_async()
        .await;

    let client = client_with(
        test_config("http://127.0.0.1:1/rss"),
        Some(provider_for(&gemini)),
    )
    .await;

    let response = client
        .post("/summarize")
        .header(ContentType::JSON)
        .body(
            json!({
                "keyword": "인공지능",
                "news": [{"title": "기사", "link": "https://news.example.com/1"}]
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::InternalServerError);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(
        body["error"],
        "답변을 생성하지 못했습니다. 잠시 후 다시 시도해주세요."
    );
}

/// Full pipeline: collect → summarize → grounded chat with history,
/// all collaborators mocked.
#[rocket::async_test]
async fn full_pipeline_grounded_chat() {
    let mut feed = Server::new_async().await;
    let feed_mock = feed
        .mock("GET", Matcher::Any)
        .with_status(200)
        .with_body(rss_feed(12))
        .create_async()
        .await;

    let mut gemini = Server::new_async().await;
    let summary_text = "이 뉴스들은 인공지능 기술 동향을 다룹니다.";
    let reply_text = "요약에 따르면 인공지능 기술 동향에 관한 기사들입니다.";

    // The two provider calls are told apart by their prompt templates.
    let summarize_mock = gemini
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::Regex("뉴스 요약 전문가".to_string()))
        .with_status(200)
        .with_body(candidates_body(summary_text))
        .create_async()
        .await;
    let chat_mock = gemini
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("뉴스 어시스턴트".to_string()),
            Matcher::Regex("사용자: 첫 질문".to_string()),
            Matcher::Regex("어시스턴트: 첫 답변".to_string()),
        ]))
        .with_status(200)
        .with_body(candidates_body(reply_text))
        .create_async()
        .await;

    let client = client_with(test_config(&feed.url()), Some(provider_for(&gemini))).await;

    // 1. Collect
    let response = client
        .get(format!("/news?keyword={ENCODED_KEYWORD}"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let collected: Value = response.into_json().await.expect("json body");
    assert_eq!(collected["keyword"], "인공지능");
    let news = collected["news"].as_array().expect("news array");
    assert_eq!(news.len(), 10);

    // 2. Summarize the collected set
    let response = client
        .post("/summarize")
        .header(ContentType::JSON)
        .body(json!({"keyword": "인공지능", "news": news}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let summarized: Value = response.into_json().await.expect("json body");
    // The mocked provider text passes through extraction unchanged
    assert_eq!(summarized["summary"], summary_text);

    // 3. Grounded chat with prior history
    let history = json!([
        {"role": "user", "text": "첫 질문"},
        {"role": "assistant", "text": "첫 답변"}
    ]);
    let response = client
        .post("/chat")
        .header(ContentType::JSON)
        .body(
            json!({
                "summary": summary_text,
                "keyword": "인공지능",
                "message": "이 기사는 무엇에 관한 것인가요?",
                "history": history
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let chat: Value = response.into_json().await.expect("json body");
    assert_eq!(chat["reply"], reply_text);

    feed_mock.assert_async().await;
    summarize_mock.assert_async().await;
    chat_mock.assert_async().await;
}
