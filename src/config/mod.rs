//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, EncryptionConfig, LogFormat, LoggingConfig, MetricsConfig,
    SchedulerConfig, ServerConfig, StorageBackend, StorageConfig,
};
