//! Counsel Chat - conversational legal assistant backend
//!
//! Serves a single chat session over HTTP. Each user turn is sent with the
//! full history to an OpenAI-compatible completion endpoint.

mod api;
mod attachment;
mod catalog;
mod llm;
mod runtime;
mod session;

use api::{create_router, AppState};
use catalog::StaticCatalog;
use chrono::Utc;
use llm::{LlmConfig, LoggingClient, OpenAIClient};
use runtime::SessionRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counsel_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let llm_config = LlmConfig::from_env();
    if llm_config.has_api_key() {
        tracing::info!(
            model = %llm_config.model,
            base_url = %llm_config.base_url,
            timeout_secs = llm_config.request_timeout.as_secs(),
            "Completion client configured"
        );
    } else {
        // Keep serving; every send will fail with a configuration error
        tracing::warn!("No API key configured. Set OPENAI_API_KEY.");
    }

    let client = LoggingClient::new(Arc::new(OpenAIClient::new(&llm_config)?));
    let session = SessionRuntime::spawn(client, llm_config.request_timeout);
    let catalog = Arc::new(StaticCatalog::demo(Utc::now()));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(session, catalog))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Counsel Chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
