//! API settings supplied by the host configuration system.
//!
//! # Design
//! The client never reads ambient state. A host hands over its key-value
//! settings through the `Settings` trait, `ApiConfig::from_settings` turns
//! them into a plain value, and that value is injected into `ApiClient`.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const BASE_URL_KEY: &str = "api_100p.base_url";
pub const BEARER_TOKEN_KEY: &str = "api_100p.bearer_token";
pub const DEFAULT_BASE_URL: &str = "https://api.100p.xcs.be/api/v1";

/// Fixed per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only key-value settings.
pub trait Settings {
    fn get_param(&self, key: &str) -> Option<String>;
}

impl Settings for HashMap<String, String> {
    fn get_param(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Settings backed by the process environment.
///
/// `api_100p.bearer_token` is looked up as `API_100P_BEARER_TOKEN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl EnvSettings {
    pub fn var_name(key: &str) -> String {
        key.replace('.', "_").to_uppercase()
    }
}

impl Settings for EnvSettings {
    fn get_param(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key)).ok()
    }
}

/// Connection settings for the article API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub bearer_token: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str, bearer_token: &str) -> Self {
        let base_url = base_url.trim();
        let base_url = if base_url.is_empty() { DEFAULT_BASE_URL } else { base_url };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.trim().to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &impl Settings) -> Self {
        let base_url = settings.get_param(BASE_URL_KEY).unwrap_or_default();
        let token = settings.get_param(BEARER_TOKEN_KEY).unwrap_or_default();
        Self::new(&base_url, &token)
    }

    pub fn has_credential(&self) -> bool {
        !self.bearer_token.is_empty()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, "")
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.has_credential() { "<redacted>" } else { "<unset>" };
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &token)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_settings_are_absent() {
        let config = ApiConfig::from_settings(&HashMap::new());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.bearer_token, "");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.has_credential());
    }

    #[test]
    fn settings_override_defaults() {
        let config = ApiConfig::from_settings(&settings(&[
            (BASE_URL_KEY, "http://localhost:3000/api/v1/"),
            (BEARER_TOKEN_KEY, "test_token"),
        ]));
        assert_eq!(config.base_url, "http://localhost:3000/api/v1");
        assert_eq!(config.bearer_token, "test_token");
        assert!(config.has_credential());
    }

    #[test]
    fn blank_base_url_falls_back_to_default() {
        let config = ApiConfig::from_settings(&settings(&[(BASE_URL_KEY, "  ")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn debug_redacts_token() {
        let config = ApiConfig::new(DEFAULT_BASE_URL, "secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn env_settings_read_process_environment() {
        // Key used by no other test, so parallel tests do not race on it.
        let key = "api_100p.env_settings_test_token";
        assert_eq!(EnvSettings.get_param(key), None);

        std::env::set_var(EnvSettings::var_name(key), "from-env");
        assert_eq!(EnvSettings.get_param(key).as_deref(), Some("from-env"));
        std::env::remove_var(EnvSettings::var_name(key));
    }

    #[test]
    fn env_var_name_derivation() {
        assert_eq!(EnvSettings::var_name(BEARER_TOKEN_KEY), "API_100P_BEARER_TOKEN");
        assert_eq!(EnvSettings::var_name(BASE_URL_KEY), "API_100P_BASE_URL");
    }
}
