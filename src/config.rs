use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "rag_assistant_client=info,rag_assistant=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment (after `.env`, if the caller loaded one).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Config::default();

        if let Some(url) = lookup("RAG_API_BASE_URL") {
            config.api_base_url = normalize_base_url(&url)?;
        }

        if let Some(raw) = lookup("RAG_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AppError::invalid_config("RAG_REQUEST_TIMEOUT_SECS", format!("'{raw}' is not a number"))
            })?;
            if secs == 0 {
                return Err(AppError::invalid_config(
                    "RAG_REQUEST_TIMEOUT_SECS",
                    "timeout must be at least one second",
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self, AppError> {
        self.api_base_url = normalize_base_url(url)?;
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| AppError::invalid_config("RAG_API_BASE_URL", format!("'{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::invalid_config(
            "RAG_API_BASE_URL",
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(trimmed.to_string())
}
