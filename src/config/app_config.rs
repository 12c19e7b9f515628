use serde::Deserialize;

use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Connection pool settings for the credential database
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_pool_lifetime_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_pool_lifetime_secs")]
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Symmetric key material used to encrypt secrets at rest
#[derive(Clone, Deserialize, Default)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub key: String,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.key.is_empty() { "<unset>" } else { "[REDACTED]" };
        f.debug_struct("EncryptionConfig").field("key", &key).finish()
    }
}

impl EncryptionConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_max_connections() -> u32 {
    25
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_pool_lifetime_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_pool_lifetime_secs(),
            max_lifetime_secs: default_pool_lifetime_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

/// Environment names used by earlier deployments, checked in order
const DATABASE_URL_FALLBACKS: [&str; 1] = ["DATABASE_URL"];
const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];
const ENCRYPTION_KEY_FALLBACKS: [&str; 2] = ["ENCRYPTION_KEY", "MYSQL_ENCRYPTION_KEY"];

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_env_fallbacks(|name| std::env::var(name).ok());

        Ok(app_config)
    }

    /// Fill the data source and key from plain environment names when the
    /// layered sources left them empty
    pub fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty())
        };

        if self.database.url.is_empty() {
            if let Some(url) = first_set(&DATABASE_URL_FALLBACKS[..]) {
                self.database.url = url;
            }
        }

        if self.encryption.key.is_empty() {
            if let Some(key) = first_set(&ENCRYPTION_KEY_FALLBACKS[..]) {
                self.encryption.key = key;
            }
        }
    }

    /// Reject configurations the process must not start with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.encryption.key.trim().is_empty() {
            return Err(DomainError::configuration(
                "encryption key is not set (APP__ENCRYPTION__KEY or ENCRYPTION_KEY)",
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(DomainError::configuration(
                "data source is not set (APP__DATABASE__URL or DATABASE_URL)",
            ));
        }

        if self.storage.backend == StorageBackend::Postgres
            && !POSTGRES_SCHEMES
                .iter()
                .any(|scheme| self.database.url.trim().starts_with(scheme))
        {
            return Err(DomainError::configuration(
                "data source must be a postgres:// or postgresql:// URL",
            ));
        }

        Ok(())
    }
}
