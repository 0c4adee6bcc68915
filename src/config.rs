use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("port must be between 1 and 65535, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticConfig,
}

/// Listener and per-connection limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Longest line (including CRLF) a client may send before the
    /// connection is dropped.
    pub max_line_length: usize,
    pub linger_ms: u64,
    pub linger_bytes: usize,
}

/// Where files are served from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub root: PathBuf,
    pub index_file: String,
    /// Where deflated bodies are staged; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 80,
            max_line_length: 8192,
            linger_ms: 1000,
            linger_bytes: 64 * 1024,
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index_file: "index.html".to_string(),
            temp_dir: None,
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// `WEBD_CONFIG` names an optional YAML file; `WEBD_BIND`, `WEBD_PORT`,
    /// `WEBD_ROOT`, `WEBD_INDEX` and `WEBD_TEMP_DIR` override individual
    /// fields.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup("WEBD_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_yaml_str(&text)?
            }
            None => Self::default(),
        };

        if let Some(bind) = lookup("WEBD_BIND") {
            cfg.server.bind = bind;
        }
        if let Some(port) = lookup("WEBD_PORT") {
            cfg.server.port = parse_port(&port)?;
        }
        if let Some(root) = lookup("WEBD_ROOT") {
            cfg.static_files.root = PathBuf::from(root);
        }
        if let Some(index) = lookup("WEBD_INDEX") {
            cfg.static_files.index_file = index;
        }
        if let Some(dir) = lookup("WEBD_TEMP_DIR") {
            cfg.static_files.temp_dir = Some(PathBuf::from(dir));
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port.to_string()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

impl StaticConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl ServerConfig {
    pub fn linger_timeout(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(value.to_string()))
}
