use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::registry::{DEFAULT_TTL_SECONDS, SelectionKind};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
/// 环境变量覆盖前缀，例如 `REGISTRY_TTL_SECONDS`
pub const ENV_PREFIX: &str = "REGISTRY_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 心跳超时（秒）
    pub ttl_seconds: u64,
    /// 后台清理间隔（秒），缺省为 ttl 的一半，0 表示关闭
    pub sweep_interval_seconds: Option<u64>,
    pub selection: SelectionKind,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            sweep_interval_seconds: None,
            selection: SelectionKind::default(),
        }
    }
}

impl RegistryConfig {
    /// 后台清理间隔，`None` 表示不启动后台清理
    pub fn sweep_interval(&self) -> Option<Duration> {
        match self.sweep_interval_seconds {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs((self.ttl_seconds / 2).max(1))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 可由环境变量覆盖的配置项
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    listen_addr: Option<String>,
    ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
    selection: Option<SelectionKind>,
    log_level: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// 加载配置：`.env` -> `config.toml`（不存在则使用默认值）-> 环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config_str)?)
    }

    /// 用 `REGISTRY_` 前缀的变量覆盖配置
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        if let Some(listen_addr) = overrides.listen_addr {
            self.server.listen_addr = listen_addr;
        }
        if let Some(ttl_seconds) = overrides.ttl_seconds {
            self.registry.ttl_seconds = ttl_seconds;
        }
        if let Some(interval) = overrides.sweep_interval_seconds {
            self.registry.sweep_interval_seconds = Some(interval);
        }
        if let Some(selection) = overrides.selection {
            self.registry.selection = selection;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "registry.ttl_seconds must be greater than zero".to_string(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "invalid listen address '{}': {e}",
                self.server.listen_addr
            ))
        })
    }
}
