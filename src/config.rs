// Client configuration, resolved from the environment

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::prefs::Preferences;
use crate::util::env as env_util;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Upper bound for one recommendation call before the cached fallback kicks in.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_STATE_FILE: &str = ".lookfinder/state.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub scan_timeout: Duration,
    pub api_token: Option<String>,
    pub state_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
            api_token: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl ClientConfig {
    /// Create config from `LOOKFINDER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let base_url = env_util::env_opt("LOOKFINDER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid LOOKFINDER_BASE_URL {base_url:?}: {e}"))?;

        let request_timeout = Duration::from_secs(env_util::env_parse(
            "LOOKFINDER_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let scan_timeout = Duration::from_secs(env_util::env_parse(
            "LOOKFINDER_SCAN_TIMEOUT_SECS",
            DEFAULT_SCAN_TIMEOUT_SECS,
        ));
        let state_file = env_util::env_opt("LOOKFINDER_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        Ok(Self {
            base_url,
            request_timeout,
            scan_timeout,
            api_token: env_util::env_opt("LOOKFINDER_API_TOKEN"),
            state_file,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fall back to the token saved in preferences when none is configured.
    pub fn with_stored_token(mut self, prefs: &Preferences) -> Self {
        if self.api_token.is_none() {
            self.api_token = prefs.auth_token.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_token_fills_missing_config_token() {
        let prefs = Preferences {
            auth_token: Some("saved".into()),
            ..Preferences::default()
        };
        let cfg = ClientConfig::default().with_stored_token(&prefs);
        assert_eq!(cfg.api_token.as_deref(), Some("saved"));
    }

    #[test]
    fn configured_token_wins_over_stored_one() {
        let prefs = Preferences {
            auth_token: Some("saved".into()),
            ..Preferences::default()
        };
        let mut cfg = ClientConfig::default();
        cfg.api_token = Some("from-env".into());
        let cfg = cfg.with_stored_token(&prefs);
        assert_eq!(cfg.api_token.as_deref(), Some("from-env"));

        let cfg = ClientConfig::default().with_stored_token(&Preferences::default());
        assert_eq!(cfg.api_token, None);
    }
}
