//! Configuration structures.
//!
//! Configuration is loaded from a JSON file; the environment is one
//! configuration *source* (credential fallback, log filter), resolved once at
//! the boundary and never read ad hoc inside core logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::errors::{Error, Result};

/// Global agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Tool host launch specs, keyed by server name.
    #[serde(default, rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, ToolHostSpec>,

    /// Completion provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Timeouts and output limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            Error::configuration(format!("invalid config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Resolve a tool host launch spec by name.
    ///
    /// With `None`, a single configured server is picked implicitly; multiple
    /// entries require an explicit name.
    pub fn host_spec(&self, name: Option<&str>) -> Result<(&str, &ToolHostSpec)> {
        match name {
            Some(name) => self
                .mcp_servers
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| {
                    Error::configuration(format!("no tool host named '{}' in config", name))
                }),
            None => {
                let mut entries = self.mcp_servers.iter();
                let first = entries
                    .next()
                    .ok_or_else(|| Error::configuration("no tool hosts configured"))?;
                if entries.next().is_some() {
                    return Err(Error::configuration(
                        "multiple tool hosts configured; pick one with --server",
                    ));
                }
                Ok((first.0.as_str(), first.1))
            }
        }
    }
}

/// How to launch one tool host subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHostSpec {
    /// Executable to spawn.
    pub command: String,

    /// Arguments, in order.
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment for the child process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Completion provider backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Anthropic,
    OpenAi,
    /// Schema-free variant: substring matching, no LLM.
    Pattern,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(BackendKind::Anthropic),
            "openai" | "open_ai" => Ok(BackendKind::OpenAi),
            "pattern" => Ok(BackendKind::Pattern),
            other => Err(Error::configuration(format!(
                "unknown provider backend '{}' (expected anthropic, openai, or pattern)",
                other
            ))),
        }
    }
}

/// Completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend family.
    pub backend: BackendKind,

    /// Model identifier; a per-backend default applies when unset.
    pub model: Option<String>,

    /// Explicit API key. When unset, the per-backend environment variable is
    /// consulted once at provider initialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override for OpenAI-compatible endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Tool to fall back to when no tool can be selected.
    ///
    /// Unset means failed selections surface as errors instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tool: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Anthropic,
            model: None,
            api_key: None,
            base_url: None,
            default_tool: None,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Chat endpoint bind address.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeouts and output limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per-request timeout for tool host calls.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Overall timeout for completion provider requests.
    #[serde(with = "humantime_serde")]
    pub provider_timeout: Duration,

    /// Maximum tokens requested from the completion provider.
    pub max_output_tokens: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            provider_timeout: Duration::from_secs(60),
            max_output_tokens: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn full_config_parses() {
        let raw = serde_json::json!({
            "mcpServers": {
                "weather": {
                    "command": "weather-mcp",
                    "args": ["--stdio"],
                    "env": {"WEATHER_API_KEY": "k"}
                }
            },
            "provider": {
                "backend": "openai",
                "model": "gpt-4o-mini",
                "default_tool": "get_weather"
            },
            "server": {"listen_addr": "0.0.0.0:9000"},
            "limits": {
                "request_timeout": "10s",
                "provider_timeout": "2m",
                "max_output_tokens": 512
            },
            "observability": {"log_level": "debug", "json_logs": true}
        });

        let config: Config = serde_json::from_value(raw).unwrap();
        let (name, spec) = config.host_spec(None).unwrap();
        assert_eq!(name, "weather");
        assert_eq!(spec.command, "weather-mcp");
        assert_eq!(spec.args, vec!["--stdio"]);
        assert_eq!(spec.env.get("WEATHER_API_KEY").unwrap(), "k");
        assert_eq!(config.provider.backend, BackendKind::OpenAi);
        assert_eq!(config.provider.default_tool.as_deref(), Some("get_weather"));
        assert_eq!(config.limits.request_timeout, Duration::from_secs(10));
        assert_eq!(config.limits.provider_timeout, Duration::from_secs(120));
        assert_eq!(config.limits.max_output_tokens, 512);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.mcp_servers.is_empty());
        assert_eq!(config.provider.backend, BackendKind::Anthropic);
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert!(config.host_spec(None).is_err());
    }

    #[test]
    fn named_host_lookup() {
        let raw = serde_json::json!({
            "mcpServers": {
                "a": {"command": "a-server"},
                "b": {"command": "b-server"}
            }
        });
        let config: Config = serde_json::from_value(raw).unwrap();

        // Ambiguous without a name
        assert!(config.host_spec(None).is_err());

        let (name, spec) = config.host_spec(Some("b")).unwrap();
        assert_eq!(name, "b");
        assert_eq!(spec.command, "b-server");

        assert!(config.host_spec(Some("missing")).is_err());
    }

    #[test]
    fn backend_from_str() {
        assert_eq!("anthropic".parse::<BackendKind>().unwrap(), BackendKind::Anthropic);
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
        assert_eq!("pattern".parse::<BackendKind>().unwrap(), BackendKind::Pattern);
        assert!("claude".parse::<BackendKind>().is_err());
    }

    #[test]
    fn from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mcpServers": {{"fs": {{"command": "mcp-fs", "args": ["/tmp"]}}}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let (name, spec) = config.host_spec(Some("fs")).unwrap();
        assert_eq!(name, "fs");
        assert_eq!(spec.args, vec!["/tmp"]);
    }

    #[test]
    fn from_file_missing_is_configuration_error() {
        let err = Config::from_file("/nonexistent/steward.json").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
