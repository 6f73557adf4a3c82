use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_PORT: u16 = 3000;

// Values shipped in the sample .env; treated the same as unset
const PLACEHOLDER_BASE_URL: &str = "https://your-memos-instance.com";
const PLACEHOLDER_ACCESS_TOKEN: &str = "your_access_token_here";

/// Which transport the server speaks on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// JSON-RPC envelopes posted to `/mcp`
    Http,
}

/// Server configuration, built once at startup
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub access_token: String,
    pub api_prefix: String,
    pub timeout: Duration,
    pub log_level: String,
    pub transport: Transport,
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let access_token = read("MEMOS_ACCESS_TOKEN")
            .filter(|token| token != PLACEHOLDER_ACCESS_TOKEN)
            .ok_or(ConfigError::Missing("MEMOS_ACCESS_TOKEN"))?;

        let base_url = read("MEMOS_BASE_URL")
            .filter(|url| url != PLACEHOLDER_BASE_URL)
            .ok_or(ConfigError::Missing("MEMOS_BASE_URL"))?;

        let api_prefix = read("MEMOS_API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());

        let timeout_secs = match read("MEMOS_TIMEOUT") {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::NotANumber {
                name: "MEMOS_TIMEOUT",
                value,
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let port = match read("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::NotANumber { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let transport = match read("MCP_TRANSPORT").map(|t| t.to_lowercase()) {
            None => Transport::Stdio,
            Some(t) if t == "stdio" => Transport::Stdio,
            Some(t) if t == "http" => Transport::Http,
            Some(other) => return Err(ConfigError::UnknownTransport(other)),
        };

        let log_level = read("LOG_LEVEL")
            .map(|level| tracing_level_name(&level))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            base_url,
            access_token,
            api_prefix,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
            transport,
            port,
        })
    }

    /// Base URL joined with the versioned API prefix
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_prefix)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("api_prefix", &self.api_prefix)
            .field("timeout", &self.timeout)
            .field("log_level", &self.log_level)
            .field("transport", &self.transport)
            .field("port", &self.port)
            .finish()
    }
}

// Accepts the level names people already put in their .env files
fn tracing_level_name(level: &str) -> String {
    match level.to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}
