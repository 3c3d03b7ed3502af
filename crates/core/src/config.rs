//! Shell configuration (environment-driven, with dev defaults).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings shared by the navigation guard and the HTTP pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    /// Base URL every API path is joined onto.
    pub api_base_url: String,
    /// Where unauthenticated users are sent.
    pub login_path: String,
    /// Where signed-in users landing on the login page are sent.
    pub home_path: String,
    /// API path returning the current user's info and roles.
    pub user_info_path: String,
    /// Upper bound on redirect/re-issue hops for one navigation.
    pub max_redirects: usize,
    pub request_timeout_secs: u64,
}

impl Default for GatehouseConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            user_info_path: "/user/info".to_string(),
            max_redirects: 8,
            request_timeout_secs: 30,
        }
    }
}

impl GatehouseConfig {
    /// Read `GATEHOUSE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("GATEHOUSE_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup("GATEHOUSE_LOGIN_PATH") {
            config.login_path = path;
        }
        if let Some(path) = lookup("GATEHOUSE_HOME_PATH") {
            config.home_path = path;
        }
        if let Some(path) = lookup("GATEHOUSE_USER_INFO_PATH") {
            config.user_info_path = path;
        }
        if let Some(raw) = lookup("GATEHOUSE_MAX_REDIRECTS") {
            config.max_redirects = raw
                .parse()
                .map_err(|e| ConfigError::invalid("GATEHOUSE_MAX_REDIRECTS", format!("{e}")))?;
        }
        if let Some(raw) = lookup("GATEHOUSE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = raw.parse().map_err(|e| {
                ConfigError::invalid("GATEHOUSE_REQUEST_TIMEOUT_SECS", format!("{e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.is_empty() {
            return Err(ConfigError::invalid("GATEHOUSE_API_URL", "must not be empty"));
        }
        for (key, path) in [
            ("GATEHOUSE_LOGIN_PATH", &self.login_path),
            ("GATEHOUSE_HOME_PATH", &self.home_path),
            ("GATEHOUSE_USER_INFO_PATH", &self.user_info_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid(key, "must be an absolute path"));
            }
        }
        if self.max_redirects == 0 {
            return Err(ConfigError::invalid("GATEHOUSE_MAX_REDIRECTS", "must be at least 1"));
        }
        Ok(())
    }
}
