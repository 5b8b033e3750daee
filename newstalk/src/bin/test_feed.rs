use common::Config;
use newstalk::ingestion;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let keyword = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "인공지능".to_string());
    let config = Config::default();

    println!("\n{}", "=".repeat(60));
    println!("Testing feed collection");
    println!("Endpoint: {}", config.feed.endpoint);
    println!("Keyword: {}", keyword);
    println!("{}", "=".repeat(60));

    match ingestion::fetch_news(&config.feed, &keyword).await {
        Ok(items) => {
            println!("✓ Fetched {} items", items.len());
            for (i, item) in items.iter().enumerate() {
                println!("\n{}. {}", i + 1, item.title);
                println!("   link: {}", item.link);
                if let Some(date) = &item.pub_date {
                    println!("   date: {}", date);
                }
                if let Some(source) = &item.source {
                    println!("   source: {}", source);
                }
                if let Some(snippet) = &item.snippet {
                    println!("   {}", snippet);
                }
            }
        }
        Err(e) => {
            eprintln!("✗ Failed: {}", e);
        }
    }
}
