//! Configuration
//!
//! Environment-driven configuration for the server and simulator binaries.

mod app_config;

#[cfg(test)]
mod tests;

pub use app_config::{
    AppConfig, ConfigError, DatabaseConfig, LoggingConfig, QueueConfig, Result, RetryConfig,
    RuntimeConfig, ServerConfig, SimulatorConfig, StorageConfig,
};
