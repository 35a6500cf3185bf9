use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Outbound event bus. When unset, outcome events are only logged.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub ai_timeout_ms: u64,
    pub jd_cache_ttl_secs: u64,
    pub jd_cache_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ai_timeout_ms: parse_env("AI_TIMEOUT_MS", 30_000)?,
            jd_cache_ttl_secs: parse_env("JD_CACHE_TTL_SECS", 86_400)?,
            jd_cache_capacity: parse_env("JD_CACHE_CAPACITY", 10_000)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
