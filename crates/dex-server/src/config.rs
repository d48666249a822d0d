use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Log filters forwarded to the orchestrator when present in the query.
pub const LOG_FILTER_KEYS: [&str; 7] = [
    "pod",
    "container",
    "since_seconds",
    "tail_lines",
    "follow",
    "previous",
    "timestamps",
];

const DEFAULT_RPC_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServiceConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FirehoseSection {
    pub latest_version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub entropy: BackendConfig,
    pub shield: BackendConfig,
    pub siren: BackendConfig,
    pub firehose: FirehoseSection,
    pub rpc: RpcConfig,
}

impl Default for Config {
    fn default() -> Self {
        let backend = |addr: &str| BackendConfig {
            addr: addr.to_string(),
        };
        Self {
            service: ServiceConfig::default(),
            entropy: backend("http://127.0.0.1:8081"),
            shield: backend("http://127.0.0.1:8082"),
            siren: backend("http://127.0.0.1:8083"),
            firehose: FirehoseSection::default(),
            rpc: RpcConfig::default(),
        }
    }
}

/// Immutable firehose settings handed to the HTTP layer at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct FirehoseSettings {
    pub latest_version: String,
    pub log_filter_keys: Vec<String>,
    pub supplied_variable_names: Vec<String>,
}

impl FirehoseSettings {
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self {
            latest_version: latest_version.into(),
            log_filter_keys: LOG_FILTER_KEYS.iter().map(|k| k.to_string()).collect(),
            supplied_variable_names: dex_firehose::alert::SUPPLIED_VARIABLE_NAMES
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    /// Loads `DEX_CONFIG` (default `./config.yaml`) and applies `DEX_*`
    /// environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = non_empty(std::env::var("DEX_CONFIG").ok())
            .unwrap_or_else(|| "./config.yaml".to_string());

        let mut cfg = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            Self::from_yaml(&raw)?
        } else {
            Self::default()
        };

        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| non_empty(get(key));

        if let Some(v) = get("DEX_SERVICE_HOST") {
            self.service.host = v;
        }
        if let Some(v) = get("DEX_SERVICE_PORT") {
            self.service.port = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DEX_SERVICE_PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("DEX_ENTROPY_ADDR") {
            self.entropy.addr = v;
        }
        if let Some(v) = get("DEX_SHIELD_ADDR") {
            self.shield.addr = v;
        }
        if let Some(v) = get("DEX_SIREN_ADDR") {
            self.siren.addr = v;
        }
        if let Some(v) = get("DEX_FIREHOSE_LATEST_VERSION") {
            self.firehose.latest_version = v;
        }
        if let Some(v) = get("DEX_RPC_TIMEOUT_MS") {
            self.rpc.timeout_ms = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DEX_RPC_TIMEOUT_MS",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.timeout_ms.clamp(1000, 10 * 60_000))
    }

    pub fn firehose_settings(&self) -> FirehoseSettings {
        FirehoseSettings::new(self.firehose.latest_version.clone())
    }
}
