//! Client configuration from the environment.
//!
//! | Variable              | Required | Meaning                              |
//! |-----------------------|----------|--------------------------------------|
//! | `BUFFER_ACCESS_TOKEN` | yes      | OAuth2 access token                  |
//! | `BUFFER_API_URL`      | no       | Base URL, defaults to the public API |
//! | `BUFFER_TIMEOUT_SECS` | no       | Whole-request timeout in seconds     |

use std::fmt;
use std::time::Duration;

use crate::client::DEFAULT_BASE_URL;
use crate::error::ConfigError;

pub const ACCESS_TOKEN_VAR: &str = "BUFFER_ACCESS_TOKEN";
pub const API_URL_VAR: &str = "BUFFER_API_URL";
pub const TIMEOUT_VAR: &str = "BUFFER_TIMEOUT_SECS";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub access_token: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup, so tests need not touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_token =
            lookup(ACCESS_TOKEN_VAR).ok_or_else(|| ConfigError::MissingVar(ACCESS_TOKEN_VAR.to_string()))?;

        let mut config = Self::new(access_token);

        if let Some(url) = lookup(API_URL_VAR) {
            config.base_url = url;
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                name: TIMEOUT_VAR.to_string(),
                reason: e.to_string(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: ACCESS_TOKEN_VAR.to_string(),
                reason: "token is empty".to_string(),
            });
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                name: API_URL_VAR.to_string(),
                reason: format!("`{}` is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }
}
