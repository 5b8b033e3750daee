/*
newstalk - single-binary main.rs
This binary starts the Rocket HTTP server exposing the news collection,
summarization and grounded chat endpoints.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newstalk::llm::gemini::GeminiProvider;
use newstalk::llm::LlmProvider;
use newstalk::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "newstalk", about = "Newstalk keyword news summarization and chat server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let config = Arc::new(config);

    // Initialize the text generation provider. A missing API key is not
    // fatal at startup: /news keeps working, while summarize and chat
    // report a configuration error.
    let llm_provider: Option<Arc<dyn LlmProvider>> = match create_llm_provider(&config) {
        Ok(provider) => {
            info!(model = %config.llm.model, "LLM provider initialized");
            Some(provider)
        }
        Err(e) => {
            warn!(%e, "LLM provider not available");
            None
        }
    };

    // Launch the Rocket server (blocking until Rocket shuts down)
    info!("Launching Rocket HTTP server");
    launch_rocket(config, llm_provider).await
}

/// Create the provider from configuration; fails when the API key
/// environment variable is unset.
fn create_llm_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
    let llm = &config.llm;
    let api_key = std::env::var(&llm.api_key_env)
        .with_context(|| format!("LLM API key env var '{}' not set", llm.api_key_env))?;

    let provider = GeminiProvider::new(&llm.api_url, &api_key, &llm.model).with_defaults(
        llm.timeout_seconds,
        llm.max_output_tokens,
        llm.temperature,
    );
    Ok(Arc::new(provider))
}
