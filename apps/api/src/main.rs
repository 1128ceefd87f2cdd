mod config;
mod documents;
mod errors;
mod interview;
mod llm_client;
mod providers;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::interview::orchestrator::{InterviewSettings, SessionOrchestrator};
use crate::interview::store::InMemorySessionStore;
use crate::llm_client::LlmClient;
use crate::providers::{HttpSpeechServices, LlmContentGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (content generation)
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.provider_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize speech services; a missing key degrades that capability instead of failing
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set, answers will not be transcribed");
    }
    if config.google_tts_api_key.is_none() {
        warn!("GOOGLE_TTS_API_KEY not set, no audio will be synthesized");
    }
    let speech = HttpSpeechServices::new(
        config.groq_api_key.clone(),
        config.google_tts_api_key.clone(),
        config.provider_timeout,
    )?;

    let settings = InterviewSettings::from_config(&config);
    info!(
        "Interview settings: timeout={:?}, silence threshold={} bytes, locales={}/{}",
        settings.provider_timeout,
        settings.silence_threshold_bytes,
        settings.primary_locale,
        settings.fallback_locale
    );

    // Sessions live only as long as the process
    let orchestrator = SessionOrchestrator::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(LlmContentGenerator::new(llm)),
        Arc::new(speech),
        settings,
    );

    // Build app state
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
