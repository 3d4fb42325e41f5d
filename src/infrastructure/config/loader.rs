use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, EmbeddingProviderKind};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid index dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Index directory cannot be empty")]
    EmptyIndexDir,

    #[error("Snapshot file names must be non-empty and distinct")]
    InvalidSnapshotFiles,

    #[error("Invalid rebuild batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid embedding max_batch_size: {0}. Must be at least 1")]
    InvalidMaxBatchSize(usize),

    #[error("Invalid generation max_retries: {0}. Must be at least 1")]
    InvalidMaxRetries(u32),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .semdex/config.yaml (project config)
    /// 3. .semdex/local.yaml (local overrides, optional)
    /// 4. Environment variables (SEMDEX_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".semdex/config.yaml"))
            .merge(Yaml::file(".semdex/local.yaml"))
            .merge(Env::prefixed("SEMDEX_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SEMDEX_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if config.index.dimension == 0 {
            return Err(ConfigError::InvalidDimension(config.index.dimension));
        }
        if config.index.dir.is_empty() {
            return Err(ConfigError::EmptyIndexDir);
        }
        if config.index.index_file.is_empty()
            || config.index.mapping_file.is_empty()
            || config.index.index_file == config.index.mapping_file
        {
            return Err(ConfigError::InvalidSnapshotFiles);
        }

        if config.embedding.max_batch_size == 0 {
            return Err(ConfigError::InvalidMaxBatchSize(config.embedding.max_batch_size));
        }
        if config.embedding.provider == EmbeddingProviderKind::Openai && config.embedding.model.is_empty() {
            return Err(ConfigError::ValidationFailed("embedding.model cannot be empty".to_string()));
        }

        if config.generation.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.generation.max_retries));
        }
        if !(0.0..=2.0).contains(&config.generation.temperature) {
            return Err(ConfigError::InvalidTemperature(config.generation.temperature));
        }

        if config.rebuild.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(config.rebuild.batch_size));
        }
        if config.rebuild.progress_interval == 0 {
            return Err(ConfigError::ValidationFailed(
                "rebuild.progress_interval must be at least 1".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
