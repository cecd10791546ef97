use std::time::Duration;

use crate::error::{AppError, Result};

pub const API_URL: &str = "http://localhost:8001";

/// Page size for `GET /api/deals`.
pub const DEALS_PAGE_SIZE: usize = 20;

/// Key under which the saved vehicle ids are stored as a JSON array.
pub const SAVED_VEHICLES_KEY: &str = "flipbot_saved_vehicles";

/// How long a quick-scrape status message stays on screen.
pub const QUICK_SCRAPE_MESSAGE_SECS: u64 = 5;

/// How long the other scrape status messages stay on screen.
pub const SCRAPE_MESSAGE_SECS: u64 = 8;

/// Channel capacity for request completions flowing back to the UI loop.
pub const CHANNEL_CAPACITY: usize = 64;

/// UI redraw / input poll interval (milliseconds).
pub const UI_TICK_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, without the `/api` suffix (FLIPBOT_API_URL)
    pub api_url: String,
    /// SQLite file backing the local key/value store (FLIPBOT_STORE_PATH)
    pub store_path: String,
    pub log_level: String,
    /// Logs go to a file; the terminal belongs to the dashboard (FLIPBOT_LOG_FILE)
    pub log_file: String,
    /// Timeout for ordinary API calls (REQUEST_TIMEOUT_SECS)
    pub request_timeout: Duration,
    /// Timeout for live scrapes, which run for minutes (SCRAPE_TIMEOUT_SECS)
    pub scrape_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: normalize_base_url(
                &std::env::var("FLIPBOT_API_URL").unwrap_or_else(|_| API_URL.to_string()),
            )?,
            store_path: std::env::var("FLIPBOT_STORE_PATH")
                .unwrap_or_else(|_| "flipbot.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: std::env::var("FLIPBOT_LOG_FILE")
                .unwrap_or_else(|_| "flipbot.log".to_string()),
            request_timeout: Duration::from_secs(secs_from_env("REQUEST_TIMEOUT_SECS", 15)?),
            scrape_timeout: Duration::from_secs(secs_from_env("SCRAPE_TIMEOUT_SECS", 180)?),
        })
    }
}

fn secs_from_env(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| AppError::Config(format!("{var} must be a positive number of seconds"))),
        Err(_) => Ok(default),
    }
}

/// Strip trailing slashes and reject anything that is not an http(s) origin.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "FLIPBOT_API_URL must start with http:// or https://, got {raw:?}"
        )));
    }
    Ok(url.to_string())
}
