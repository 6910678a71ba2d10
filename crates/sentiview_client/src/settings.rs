use std::env;
use std::time::Duration;

use sentiview_core::DEFAULT_TTL;

pub const API_URL_ENV: &str = "SENTIVIEW_API_URL";
pub const POLL_MS_ENV: &str = "SENTIVIEW_POLL_MS";
pub const DEBOUNCE_MS_ENV: &str = "SENTIVIEW_DEBOUNCE_MS";

/// How the stored token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// `Authorization: Token <token>`, as issued by `api-token-auth/`.
    #[default]
    Token,
    Bearer,
}

impl AuthScheme {
    pub fn header_value(self, token: &str) -> String {
        match self {
            AuthScheme::Token => format!("Token {token}"),
            AuthScheme::Bearer => format!("Bearer {token}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub jobs_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub debounce_window: Duration,
    pub cache_ttl: Duration,
    pub auth_scheme: AuthScheme,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/".to_string(),
            jobs_path: "analyze".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(3000),
            debounce_window: Duration::from_millis(300),
            cache_ttl: DEFAULT_TTL,
            auth_scheme: AuthScheme::default(),
        }
    }
}

impl ClientSettings {
    /// Defaults with environment overrides applied. Unparseable values are
    /// ignored.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                settings.base_url = url.trim().to_string();
            }
        }
        if let Some(ms) = env_millis(POLL_MS_ENV) {
            settings.poll_interval = ms;
        }
        if let Some(ms) = env_millis(DEBOUNCE_MS_ENV) {
            settings.debounce_window = ms;
        }
        settings
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
