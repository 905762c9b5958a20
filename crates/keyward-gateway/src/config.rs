//! Gateway configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8081").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Listen address for the key-rotation endpoints (e.g., "127.0.0.1:9081").
    #[serde(default = "GatewayConfig::default_internal_listen_addr")]
    pub internal_listen_addr: String,

    /// Allowed CORS origins; `*` allows any.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// An environment variable held a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {name}: {reason}")]
pub struct ConfigError {
    /// Variable name.
    pub name: &'static str,
    /// Parse failure.
    pub reason: String,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8081".to_string()
    }

    fn default_internal_listen_addr() -> String {
        "127.0.0.1:9081".to_string()
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MiB, the token endpoint's limit
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Read `LISTEN_ADDR`, `INTERNAL_LISTEN_ADDR`, `CORS_ORIGINS`
    /// (comma-separated), `MAX_BODY_BYTES`, and `REQUEST_TIMEOUT_SECONDS`
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`GatewayConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(addr) = lookup("INTERNAL_LISTEN_ADDR") {
            config.internal_listen_addr = addr;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("MAX_BODY_BYTES") {
            config.max_body_bytes = parse_var("MAX_BODY_BYTES", &v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = parse_var("REQUEST_TIMEOUT_SECONDS", &v)?;
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        name,
        reason: e.to_string(),
    })
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            internal_listen_addr: Self::default_internal_listen_addr(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8081");
        assert_eq!(config.internal_listen_addr, "127.0.0.1:9081");
        assert_eq!(config.cors_origins, ["*"]);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn deserialize_partial() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"listen_addr": "127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.internal_listen_addr, "127.0.0.1:9081");
        assert_eq!(config.cors_origins, ["*"]);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn environment_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "127.0.0.1:9100"),
            ("INTERNAL_LISTEN_ADDR", "10.0.0.5:9200"),
            ("CORS_ORIGINS", "https://app.example.com, https://admin.example.com,"),
            ("REQUEST_TIMEOUT_SECONDS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9100");
        assert_eq!(config.internal_listen_addr, "10.0.0.5:9200");
        assert_eq!(
            config.cors_origins,
            ["https://app.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn unparsable_number_rejected() {
        let err = GatewayConfig::from_lookup(lookup(&[("MAX_BODY_BYTES", "lots")])).unwrap_err();
        assert_eq!(err.name, "MAX_BODY_BYTES");
    }
}
