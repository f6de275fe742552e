//! Configuration file parsing.
//!
//! A TOML file passed explicitly on the command line can supply default
//! values for scan options. There is no discovery of config files in
//! standard locations and no environment lookup; a value given as a CLI flag
//! always overrides the file.
//!
//! ```toml
//! [defaults]
//! domain = "example.com"
//! concurrency = 20
//! timeout = "5s"
//! cookies = "session=abc"
//! ```

use crate::error::CorsProbeError;
use crate::types::CheckConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default values for CLI options
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Domain substituted into origin candidates
    pub domain: Option<String>,

    /// Worker pool size
    pub concurrency: Option<usize>,

    /// Per-request timeout (as string, e.g., "5s", "1m", "10")
    pub timeout: Option<String>,

    /// Raw Cookie header value
    pub cookies: Option<String>,

    /// User-Agent header value
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Load and validate configuration from a specific file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CorsProbeError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            CorsProbeError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        config.validate()?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Validate a configuration for values that cannot be used.
    pub fn validate(&self) -> Result<(), CorsProbeError> {
        let Some(defaults) = &self.defaults else {
            return Ok(());
        };

        if defaults.concurrency == Some(0) {
            return Err(CorsProbeError::config("Concurrency must be at least 1"));
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_timeout_string(timeout_str).is_none() {
                return Err(CorsProbeError::config(format!(
                    "Invalid timeout '{}'. Use a value like '5s', '30s', '2m' ('0' disables it)",
                    timeout_str
                )));
            }
        }

        if let Some(user_agent) = &defaults.user_agent {
            if user_agent.trim().is_empty() {
                return Err(CorsProbeError::config("user_agent cannot be empty"));
            }
        }

        Ok(())
    }

    /// Layer the file's defaults over `config`.
    ///
    /// Only values present in the file replace those in `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(domain) = &defaults.domain {
            config = config.with_domain(domain.clone());
        }
        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(cookies) = &defaults.cookies {
            config = config.with_cookies(cookies.clone());
        }
        if let Some(user_agent) = &defaults.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }

        config
    }
}

/// Parse timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}
