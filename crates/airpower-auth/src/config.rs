//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for token issuing, verification and identity caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret. Must be at least 32 bytes.
    #[serde(default)]
    pub secret: String,

    /// Lifetime of issued access tokens, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Lifetime of cached identities, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Whether the identity cache is used at all.
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_enabled: default_cache_enabled(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.len() < 32 {
            return Err("auth.secret must be at least 32 bytes".to_string());
        }
        if self.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be greater than zero".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("auth.cache_ttl_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Access token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Cached identity lifetime.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_one_hour_ttls() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.cache_enabled);
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AuthConfig {
            secret: "too-short".into(),
            ..AuthConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn long_secret_passes_validation() {
        let config = AuthConfig {
            secret: "0123456789abcdef0123456789abcdef".into(),
            ..AuthConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
