//! Configuration structs
//!
//! Components take explicit config structs at construction instead of
//! reading a shared global config object. The environment is only
//! consulted in the `from_env` constructors called by the binary.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// FlowVisor JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowvisorConfig {
    /// The JSON-RPC URL for the FlowVisor controller.
    pub jrpc_url: String,
    /// FlowVisor admin username.
    pub username: String,
    /// FlowVisor admin password.
    pub password: String,
}

impl Default for FlowvisorConfig {
    fn default() -> Self {
        Self {
            jrpc_url: "https://localhost:8081".to_string(),
            username: "fvadmin".to_string(),
            password: String::new(),
        }
    }
}

impl FlowvisorConfig {
    /// Build from `FV_JRPC_URL` / `FV_USERNAME` / `FV_PASSWORD`, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            jrpc_url: get_config("FV_JRPC_URL", &defaults.jrpc_url),
            username: get_config("FV_USERNAME", &defaults.username),
            password: get_config("FV_PASSWORD", &defaults.password),
        };
        debug!("FlowVisor endpoint: {} as {}", config.jrpc_url, config.username);
        config
    }
}

/// Local topology store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLx database URL, e.g. `sqlite:fv-sync.db?mode=rwc` or
    /// `sqlite::memory:`.
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:fv-sync.db?mode=rwc".to_string(),
        }
    }
}

impl StoreConfig {
    /// Build from `FV_DATABASE_URL`, falling back to the default.
    pub fn from_env() -> Self {
        Self {
            database_url: get_config("FV_DATABASE_URL", &Self::default().database_url),
        }
    }
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_flowvisor_shipping_config() {
        let config = FlowvisorConfig::default();
        assert_eq!(config.jrpc_url, "https://localhost:8081");
        assert_eq!(config.username, "fvadmin");
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_get_config_falls_back() {
        assert_eq!(get_config("FV_SYNC_UNSET_KEY", "fallback"), "fallback");
        assert_eq!(get_config_opt("FV_SYNC_UNSET_KEY"), None);
    }
}
