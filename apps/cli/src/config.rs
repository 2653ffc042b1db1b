use std::{fs, path::Path, time::Duration};

use client_core::{controller::DEFAULT_NOTICE_TTL, GatewayOptions};
use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "reservas.toml";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub notice_ttl_seconds: u64,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            notice_ttl_seconds: DEFAULT_NOTICE_TTL.as_secs(),
            request_timeout_seconds: None,
        }
    }
}

impl Settings {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_seconds)
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            base_url: self.api_base_url.clone(),
            request_timeout: self
                .request_timeout_seconds
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    notice_ttl_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the toml file at `path` if present, then environment
/// overrides read through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.notice_ttl_seconds {
                    settings.notice_ttl_seconds = v;
                }
                if let Some(v) = file_cfg.request_timeout_seconds {
                    settings.request_timeout_seconds = Some(v);
                }
            }
            Err(err) => warn!(path = %path.display(), "config: ignoring unreadable file: {err}"),
        }
    }

    if let Some(v) = env("RESERVAS_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__NOTICE_TTL_SECONDS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.notice_ttl_seconds = parsed;
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_seconds = Some(parsed);
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
