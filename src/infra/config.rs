use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    FetchRequest, DEFAULT_ENDPOINT, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_INVOKE_TIMEOUT,
    DEFAULT_MAX_LENGTH, DEFAULT_PROTOCOL_VERSION,
};
use crate::infra::runtime::limits::DEFAULT_CONNECT_TIMEOUT;

pub const CONFIG_PATH_ENV: &str = "FETCH_GATEWAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "fetch-gateway.toml";

pub struct Config {
    pub mode: String, // "server" or "stdio"
    pub port: u16,
    pub deprecate_rest: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE").unwrap_or_else(|_| "server".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let deprecate_rest = std::env::var("DEPRECATE_REST")
            .map(|v| !v.is_empty())
            .unwrap_or(false);

        Self {
            mode,
            port,
            deprecate_rest,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Defaults applied to every fetch the gateway performs on behalf of a caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub protocol_version: String,
    pub client_name: String,
    pub client_version: String,
    pub max_length: usize,
    pub ignore_robots: bool,
    pub handshake_timeout_ms: u64,
    pub invoke_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            max_length: DEFAULT_MAX_LENGTH,
            ignore_robots: true,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64,
            invoke_timeout_ms: DEFAULT_INVOKE_TIMEOUT.as_millis() as u64,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl FetchSettings {
    /// A request for `url` carrying these defaults.
    pub fn request(&self, url: impl Into<String>) -> FetchRequest {
        let mut req = FetchRequest::new(url)
            .with_endpoint(self.endpoint.clone())
            .with_protocol_version(self.protocol_version.clone())
            .with_client(self.client_name.clone(), self.client_version.clone())
            .with_max_length(self.max_length)
            .with_ignore_robots(self.ignore_robots)
            .with_timeouts(
                Duration::from_millis(self.handshake_timeout_ms),
                Duration::from_millis(self.invoke_timeout_ms),
            );
        if let Some(key) = &self.api_key {
            req = req.with_api_key(key.clone());
        }
        req
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_non_empty("FETCH_MCP_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = env_non_empty("FETCH_MCP_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = env_non_empty("FETCH_PROTOCOL_VERSION") {
            self.protocol_version = v;
        }
        if let Some(v) = env_non_empty("FETCH_MAX_LENGTH").and_then(|s| s.parse().ok()) {
            self.max_length = v;
        }
        if let Some(v) = env_non_empty("FETCH_IGNORE_ROBOTS").and_then(|s| parse_flag(&s)) {
            self.ignore_robots = v;
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchSettings,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Missing file means defaults; unreadable or invalid file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn config_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into())
    }

    /// TOML file (if any) with env overrides on top.
    pub fn try_from_env_and_toml() -> Result<Self, ConfigError> {
        let mut cfg = Self::load(Path::new(&Self::config_path()))?;
        cfg.fetch.apply_env();
        Ok(cfg)
    }

    /// Like [`Self::try_from_env_and_toml`] but falls back to env-only defaults.
    pub fn from_env_and_toml() -> Self {
        Self::try_from_env_and_toml().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring invalid config file");
            let mut cfg = Self::default();
            cfg.fetch.apply_env();
            cfg
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const FETCH_ENV: [&str; 6] = [
        CONFIG_PATH_ENV,
        "FETCH_MCP_ENDPOINT",
        "FETCH_MCP_API_KEY",
        "FETCH_PROTOCOL_VERSION",
        "FETCH_MAX_LENGTH",
        "FETCH_IGNORE_ROBOTS",
    ];

    fn clear_fetch_env() {
        for key in FETCH_ENV {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_to_server_8080_and_rest_enabled() {
        std::env::remove_var("MODE");
        std::env::remove_var("PORT");
        std::env::remove_var("DEPRECATE_REST");
        let cfg = Config::from_env();
        assert_eq!(cfg.mode, "server");
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.deprecate_rest);
    }

    #[test]
    #[serial]
    fn parses_env_overrides() {
        std::env::set_var("MODE", "stdio");
        std::env::set_var("PORT", "9090");
        std::env::set_var("DEPRECATE_REST", "1");
        let cfg = Config::from_env();
        assert_eq!(cfg.mode, "stdio");
        assert_eq!(cfg.port, 9090);
        assert!(cfg.deprecate_rest);
        std::env::remove_var("MODE");
        std::env::remove_var("PORT");
        std::env::remove_var("DEPRECATE_REST");
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [fetch]
            endpoint = "http://localhost:9000/mcp"
            max_length = 500
            invoke_timeout_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fetch.endpoint, "http://localhost:9000/mcp");
        assert_eq!(cfg.fetch.max_length, 500);
        assert!(cfg.fetch.ignore_robots);
        assert_eq!(cfg.fetch.protocol_version, "2024-11-05");

        let req = cfg.fetch.request("https://example.com");
        assert_eq!(req.endpoint, "http://localhost:9000/mcp");
        assert_eq!(req.invoke_timeout, Duration::from_millis(1500));
        assert_eq!(req.handshake_timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = AppConfig::from_toml_str("[fetch\nendpoint=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    #[serial]
    fn env_overrides_win_over_file() {
        clear_fetch_env();
        std::env::set_var(CONFIG_PATH_ENV, "/definitely/not/here.toml");
        std::env::set_var("FETCH_MCP_ENDPOINT", "http://env/mcp");
        std::env::set_var("FETCH_MCP_API_KEY", "k");
        std::env::set_var("FETCH_MAX_LENGTH", "42");
        std::env::set_var("FETCH_IGNORE_ROBOTS", "false");
        let cfg = AppConfig::from_env_and_toml();
        assert_eq!(cfg.fetch.endpoint, "http://env/mcp");
        assert_eq!(cfg.fetch.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.fetch.max_length, 42);
        assert!(!cfg.fetch.ignore_robots);
        clear_fetch_env();
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
