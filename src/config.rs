use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MOCK_LATENCY_MS: u64 = 2000;
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderKind {
    Mock { latency: Duration },
    Live(LiveSettings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSettings {
    pub base_url: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Runtime configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub responder: ResponderKind,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;

        let kind = get("RESPONDER").map(|v| v.to_lowercase());
        let responder = match kind.as_deref() {
            None | Some("mock") => ResponderKind::Mock {
                latency: Duration::from_millis(parse_or(
                    get("MOCK_LATENCY_MS"),
                    "MOCK_LATENCY_MS",
                    DEFAULT_MOCK_LATENCY_MS,
                )?),
            },
            Some("live") => ResponderKind::Live(LiveSettings {
                base_url: get("OLLAMA_API_BASE_URL"),
                model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(parse_or(
                    get("RESPONDER_TIMEOUT_SECS"),
                    "RESPONDER_TIMEOUT_SECS",
                    DEFAULT_TIMEOUT_SECS,
                )?),
            }),
            Some(other) => return Err(AppError::invalid_config("RESPONDER", other)),
        };

        Ok(Self { port, responder, database_url: get("DATABASE_URL") })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match raw {
        Some(v) => v.parse().map_err(|_| AppError::invalid_config(key, v)),
        None => Ok(default),
    }
}
