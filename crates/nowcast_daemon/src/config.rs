use anyhow::Context;
use nowcast_core::{default_candidates, History, NowcastError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Attach a permissive CORS layer to every route
    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model artifacts to try, in order. The first one that loads is used.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Maximum samples kept in memory. Unset keeps every sample.
    #[serde(default)]
    pub retention: Option<usize>,
}

impl HistoryConfig {
    pub fn build(&self) -> Result<History, NowcastError> {
        match self.retention {
            Some(cap) => History::with_retention(cap),
            None => Ok(History::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable text
    #[serde(default = "default_true")]
    pub json: bool,
    /// Level (`trace`, `debug`, `info`, `warn`, `error`, `off`) used when RUST_LOG is not set
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: true,
            level: default_level(),
        }
    }
}

impl Config {
    /// Reads `path` as TOML, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of the file/default values.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        models: Vec<PathBuf>,
    ) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if !models.is_empty() {
            self.model.candidates = models;
        }
        self
    }
}
