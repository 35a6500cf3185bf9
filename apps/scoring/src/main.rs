mod config;
mod errors;
mod events;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::events::{EventPublisher, LogEventPublisher, RedisEventPublisher};
use crate::llm_client::{AiGateway, LlmClient};
use crate::routes::build_router;
use crate::scoring::jd_cache::JdCache;
use crate::scoring::ScoringService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scoring service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client behind the timeout gateway
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let ai = AiGateway::new(Arc::new(llm), Duration::from_millis(config.ai_timeout_ms));

    // Initialize outbound event publisher
    let publisher: Arc<dyn EventPublisher> = match &config.redis_url {
        Some(url) => {
            info!("Publishing scoring events to Redis");
            Arc::new(RedisEventPublisher::new(url)?)
        }
        None => {
            warn!("REDIS_URL not set, scoring events will only be logged");
            Arc::new(LogEventPublisher)
        }
    };

    let cache = JdCache::new(
        Duration::from_secs(config.jd_cache_ttl_secs),
        config.jd_cache_capacity,
    );
    info!(
        "JD cache: ttl {}s, capacity {}",
        config.jd_cache_ttl_secs, config.jd_cache_capacity
    );

    let scoring = ScoringService::new(ai, cache, publisher)?;
    let state = AppState {
        scoring: Arc::new(scoring),
    };

    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
