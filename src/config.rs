use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// `development` or `production`
    #[serde(default = "default_environment")]
    pub environment: String,
    pub gateway: GatewayConfig,
    pub control_db: ControlDbConfig,
    #[serde(default)]
    pub tenant_pool: TenantPoolConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Token for /api/admin routes. Admin routes answer 500 when unset.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Create control-plane tables and the default tenant on startup
    #[serde(default)]
    pub auto_init_schema: bool,
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ControlDbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

/// Settings applied to every per-tenant pool
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TenantPoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bounded wait for a connection; exceeding it is `POOL_EXHAUSTED`
    pub acquire_timeout_ms: u64,
    pub idle_timeout_ms: u64,
}

impl Default for TenantPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 0,
            acquire_timeout_ms: 2_000,
            idle_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Maximum |server time - X-Timestamp|, inclusive
    pub replay_window_ms: u64,
    /// Tenant used when X-Project-ID is absent
    pub default_project: String,
    /// Level for gate decisions; `log_level` when unset
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            replay_window_ms: 5 * 60 * 1000,
            default_project: "default".to_string(),
            log_level: None,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// `DATABASE_URL` and `ADMIN_TOKEN` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.control_db.url = url;
        }
        if let Ok(token) = std::env::var("ADMIN_TOKEN") {
            self.admin_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_pool.acquire_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "tenant_pool.acquire_timeout_ms must be > 0".into(),
            ));
        }
        if self.tenant_pool.min_connections > self.tenant_pool.max_connections {
            return Err(ConfigError::Invalid(
                "tenant_pool.min_connections exceeds max_connections".into(),
            ));
        }
        if self.auth.default_project.is_empty() {
            return Err(ConfigError::Invalid("auth.default_project is empty".into()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
